//! Look up a callsign on any supported provider and print the record.
//!
//! Usage:
//! ```
//! cargo run --example lookup -- callook W1AW
//! QRZ_USERNAME=user QRZ_PASSWORD=pass cargo run --example lookup -- qrz W1AW
//! HAMQTH_USERNAME=user HAMQTH_PASSWORD=pass cargo run --example lookup -- hamqth OK1RR
//! ```
//!
//! For providers that need a login, `<PROVIDER>_SESSION_KEY` seeds a
//! previously obtained session token; the token in use after the lookup is
//! printed so it can be reused.
//!
//! Pass `--json` after the callsign to print the whole record as JSON.

use callsign_lookup::{
    AsyncClient, CallookAsyncClient, CallsignLookupError, CallsignRecord, HamQth, LoginProvider,
    Qrz, QrzCq,
};
use std::env;

async fn login_lookup<P: LoginProvider>(
    prefix: &str,
    callsign: &str,
) -> Result<CallsignRecord, Box<dyn std::error::Error>> {
    let username = env::var(format!("{}_USERNAME", prefix))
        .map_err(|_| format!("{}_USERNAME environment variable must be set", prefix))?;
    let password = env::var(format!("{}_PASSWORD", prefix))
        .map_err(|_| format!("{}_PASSWORD environment variable must be set", prefix))?;
    let session_key = env::var(format!("{}_SESSION_KEY", prefix)).unwrap_or_default();

    let mut client = AsyncClient::<P>::new(username, password).with_session_key(session_key);
    client.start()?;
    let result = client.search(callsign).await;
    if let Some(key) = client.session_key() {
        eprintln!("{}_SESSION_KEY={}", prefix, key);
    }
    client.close();
    Ok(result?)
}

async fn callook_lookup(callsign: &str) -> Result<CallsignRecord, CallsignLookupError> {
    let mut client = CallookAsyncClient::new();
    client.start()?;
    let result = client.search(callsign).await;
    client.close();
    result
}

fn print_record(record: &CallsignRecord) {
    println!("{} (from {})", record.query, record.data_source);
    if let Some(call) = &record.callsign {
        println!("  Callsign: {}", call);
    }
    if let Some(name) = &record.name {
        println!("  Name: {}", name);
    }
    if let Some(class) = &record.lic_class {
        println!("  Class: {}", class);
    }
    if let Some(trustee) = &record.trustee {
        println!("  Trustee: {}", trustee);
    }
    if let Some(address) = &record.address {
        println!("  Address:");
        for line in address.to_string().lines() {
            println!("    {}", line);
        }
    }
    if let Some(dxcc) = &record.dxcc {
        println!("  DXCC: {}", dxcc);
    }
    if let Some(grid) = &record.grid {
        println!("  Grid: {}", grid);
    }
    if let Some(latlong) = &record.latlong {
        println!("  Location: {}", latlong);
    }
    if let Some(qsl) = &record.qsl {
        println!("  QSL:");
        for line in qsl.to_string().lines() {
            println!("    {}", line);
        }
    }
    if let Some(url) = &record.url {
        println!("  URL: {}", url);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <qrz|callook|hamqth|qrzcq> <callsign> [--json]", args[0]);
        std::process::exit(1);
    }
    let callsign = &args[2];
    let as_json = args.get(3).map(|a| a == "--json").unwrap_or(false);

    let record = match args[1].to_lowercase().as_str() {
        "qrz" => login_lookup::<Qrz>("QRZ", callsign).await?,
        "hamqth" => login_lookup::<HamQth>("HAMQTH", callsign).await?,
        "qrzcq" => login_lookup::<QrzCq>("QRZCQ", callsign).await?,
        "callook" => callook_lookup(callsign).await?,
        other => {
            eprintln!("Unknown provider: {}", other);
            std::process::exit(1);
        }
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}
