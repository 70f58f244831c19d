use s7set_client::{ClientConfig, S7Client};
use s7set_datalink::Tsap;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = S7Client::connect(
        "127.0.0.1:102",
        Tsap::rack_slot(0, 1)?,
        ClientConfig::default(),
    )
    .await?;

    client.write_db(10, 6, &225i16.to_be_bytes()).await?;
    println!("pdu length: {:?}", client.pdu_length());
    client.close().await?;
    Ok(())
}
