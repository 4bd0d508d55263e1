/// Whether `host` (optionally with a `:port` suffix) is a development host:
/// `localhost`, `127.0.0.1`, or any name ending in `.local`.
pub fn is_development_host(host: &str) -> bool {
    let hostname = strip_port(host.trim()).to_ascii_lowercase();
    hostname == "localhost" || hostname == "127.0.0.1" || hostname.ends_with(".local")
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
