// Example: derive deposit addresses locally, without calling the signer nodes
// Run with: cargo run -p deposit-address --example derive_address

use anyhow::Result;
use deposit_address::{
    derive_multisig, generate_passphrase, parse_xpubs, path_string, AddressNetwork, SCRIPT_TYPE,
};

fn main() -> Result<()> {
    println!("=== Local Deposit Address Derivation ===\n");

    // Account xpubs of the three signer nodes (m/48'/0'/0'/2')
    let xpubs = parse_xpubs(&[
        "xpub6EkTGi8Kh6bqYpZzFeoANKQh7nH1GiChpb1StmTSoUG3QA1u6yf6dYprGjWiMBKcTEQ1KFDBNDL4sxDh45AiD7EkFC3yeD23Vkf3yzYSwEb",
        "xpub6EV2WhLpxRVKo6NPRCXniPmFapNhfeUwzuTZDpsvdiGGa8cPaqzLPqmPmtYy53wXG4NcGZErkPVuFaKQnP3DYCHyTvg1mLyf4vttBdqErFG",
        "xpub6DyBA7T961cEFdmrvapjPHJGS8abivTPJ9ERFkAZKrz7r9p8Vb33BaenC4JnMia3CuX4byLfS79nJh7qHPGHFHTXR5gjvp8J1r76bXBU7Fx",
    ])?;

    // Example passphrase (in production, use a fresh random value per deposit)
    let passphrase = "550e8400-e29b-41d4-a716-446655440000";
    println!("Passphrase: {}", passphrase);

    let derived = derive_multisig(&xpubs, passphrase, AddressNetwork::Main)?;
    println!("Derivation path: {}", path_string(&derived.path));
    println!("  (10 levels of 24 bits, all non-hardened)\n");

    println!("Script type: {}", SCRIPT_TYPE);
    println!("Witness script: {}", derived.witness_script_hex());
    println!("Descriptor: {}", derived.descriptor());
    println!("Mainnet address: {}", derived.address);

    let testnet = derive_multisig(&xpubs, passphrase, AddressNetwork::Test)?;
    println!("Testnet address: {}", testnet.address);
    println!();

    println!("=== New Deposit ===\n");
    let fresh = generate_passphrase();
    let derived = derive_multisig(&xpubs, &fresh, AddressNetwork::Main)?;
    println!("Passphrase: {}", fresh);
    println!("Address: {}", derived.address);
    println!();
    println!("// Store (user_id, passphrase, address); the signers only need the passphrase.");

    Ok(())
}
