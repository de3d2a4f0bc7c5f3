use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// URL of the dashboard served at `addr`.
///
/// Unspecified bind addresses (0.0.0.0 / ::) are mapped to loopback so the
/// URL is openable locally.
pub fn dashboard_url(addr: SocketAddr) -> String {
    let host = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}/", SocketAddr::new(host, addr.port()))
}

/// Open the dashboard in the user's default browser
///
/// # Errors
/// Returns error if browser cannot be opened (e.g., no browser available)
pub fn open_dashboard(addr: SocketAddr) -> Result<()> {
    let url = dashboard_url(addr);
    webbrowser::open(&url)
        .with_context(|| format!("Failed to open browser for URL: {}", url))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_url_loopback() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(dashboard_url(addr), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_dashboard_url_unspecified() {
        let addr: SocketAddr = "0.0.0.0:3000".parse().unwrap();
        assert_eq!(dashboard_url(addr), "http://127.0.0.1:3000/");

        let addr: SocketAddr = "[::]:3000".parse().unwrap();
        assert_eq!(dashboard_url(addr), "http://[::1]:3000/");
    }
}
