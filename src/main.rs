#[tokio::main]
async fn main() {
    session_booking::run().await;
}
