use anyhow::Result;
use tgrade_tools::signer::KeySigner;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <HEX_PRIVATE_KEY> [ACCOUNT_PREFIX]", args[0]);
        std::process::exit(1);
    }

    let prefix = args.get(2).map(String::as_str).unwrap_or("tgrade");
    let signer = KeySigner::from_hex(&args[1], prefix)?;

    println!("🔐 Signer address: {}", signer.account_id());
    println!("💰 Send some {} to this address to pay compound transaction fees", tgrade_tools::coin::DISPLAY_DENOM);

    Ok(())
}
