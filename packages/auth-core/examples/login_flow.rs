//! Wire the client, session store, and account service against a locally
//! running backend, then log in and print the restored profile.
//!
//! ```sh
//! cargo run -p dacsan-auth --example login_flow -- anh@example.com secret
//! ```

use std::sync::Arc;

use dacsan_api::ApiClient;
use dacsan_auth::{AccountService, MemoryStore, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let email = args.next().unwrap_or_else(|| "anh@example.com".to_string());
    let password = args.next().unwrap_or_else(|| "secret".to_string());

    let base_url =
        std::env::var("DACSAN_API_URL").unwrap_or_else(|_| "http://localhost:3001/api".to_string());
    let api = Arc::new(ApiClient::new(base_url)?);
    let session = Arc::new(SessionStore::new(
        Arc::new(MemoryStore::new()),
        api.clone(),
    ));

    let account = AccountService::new(api, session.clone());
    let response = account.login(&email, &password).await?;

    if response.success {
        if let Some(user) = session.current_user() {
            println!("Đăng nhập thành công: {} <{}>", user.full_name, user.email);
        }
    } else {
        eprintln!("Đăng nhập thất bại: {}", response.message);
    }
    Ok(())
}
