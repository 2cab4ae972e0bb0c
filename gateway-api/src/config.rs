use mini_config::Configure;

#[derive(Debug, Clone, Configure)]
pub enum Api {
    TCPAddress,
    CoreInternalUrl,
}

pub fn init() {
    Api::TCPAddress.set("127.0.0.1:30099");
    Api::CoreInternalUrl.set(
        std::env::var("GATEWAY_CORE_INTERNAL_URL").unwrap_or_else(|_| "http://127.0.0.1:8081".to_string()),
    );
}
