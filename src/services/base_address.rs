use url::{Origin, Url};

use crate::error::AppError;

pub const DOCS_PATH: &str = "/swagger-ui/index.html";
pub const GENERATE_PATH: &str = "/api/generator/generate";
pub const VALIDATE_PATH: &str = "/api/generator/validate";
pub const PREVIEW_PATH: &str = "/api/generator/preview";
pub const GENERATED_PATH: &str = "/api/generator/generated";

/// 开发服务器端口到应用服务器端口的改写规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRewrite {
    pub dev_server_port: u16,
    pub app_server_port: u16,
}

impl Default for PortRewrite {
    fn default() -> Self {
        Self {
            dev_server_port: 63342,
            app_server_port: 8080,
        }
    }
}

/// 由页面的 origin 推导生成器服务的根地址。
/// 端口等于开发服务器端口时改写为应用服务器端口，其余保持不变。
pub fn derive_base_address(origin: &str, rewrite: PortRewrite) -> Result<String, AppError> {
    let mut url = Url::parse(origin.trim())
        .map_err(|e| AppError::InvalidOrigin(format!("{origin}: {e}")))?;

    if url.port() == Some(rewrite.dev_server_port) {
        url.set_port(Some(rewrite.app_server_port))
            .map_err(|_| AppError::InvalidOrigin(format!("{origin}: cannot carry a port")))?;
    }

    match url.origin() {
        origin @ Origin::Tuple(..) => Ok(origin.ascii_serialization()),
        Origin::Opaque(_) => Err(AppError::InvalidOrigin(format!("{origin}: not an http origin"))),
    }
}

pub fn docs_link(base_url: &str) -> String {
    format!("{base_url}{DOCS_PATH}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_port_is_rewritten() {
        let base = derive_base_address("http://localhost:63342", PortRewrite::default()).unwrap();
        assert_eq!(base, "http://localhost:8080");
        assert_eq!(docs_link(&base), "http://localhost:8080/swagger-ui/index.html");
    }

    #[test]
    fn other_ports_are_kept() {
        let base = derive_base_address("https://forms.example.com:9443", PortRewrite::default()).unwrap();
        assert_eq!(base, "https://forms.example.com:9443");

        let base = derive_base_address("http://127.0.0.1", PortRewrite::default()).unwrap();
        assert_eq!(base, "http://127.0.0.1");
    }

    #[test]
    fn path_and_query_are_dropped() {
        let base = derive_base_address("http://localhost:63342/project/index.html?_ijt=x", PortRewrite::default())
            .unwrap();
        assert_eq!(base, "http://localhost:8080");
    }

    #[test]
    fn custom_rewrite() {
        let rewrite = PortRewrite {
            dev_server_port: 5173,
            app_server_port: 3001,
        };
        let base = derive_base_address("http://localhost:5173", rewrite).unwrap();
        assert_eq!(base, "http://localhost:3001");
    }

    #[test]
    fn rejects_non_http_origin() {
        assert!(derive_base_address("not a url", PortRewrite::default()).is_err());
        assert!(derive_base_address("file:///tmp/index.html", PortRewrite::default()).is_err());
    }
}
