pub const BANNER: &str = "✅ Backend Yamaro API is running.";

pub async fn banner() -> &'static str {
    BANNER
}
