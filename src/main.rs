//! Safe deployment toolkit CLI
//!
//! Usage:
//!   smol-safe mine --owner 0xA..,0xB.. -t 2 --prefix 5afe
//!   smol-safe predict --owner 0xA.. --salt-nonce 42 --safe-version v1.4.1 --init-code-hash 0x..
//!   smol-safe encode --owner 0xA.. --owner 0xB.. -t 1
//!   smol-safe decode 0x1688f0b9...

use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use smol_safe::config::{Command, DecodeArgs, EncodeArgs, MineArgs, PredictArgs};
use smol_safe::{
    Cli, DeploymentVersion, SafeCalldata, SafeDeployment, SafeSetup, Settings, VanityMatch, WorkerPool,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.settings.as_deref()).context("failed to read settings file")?;

    match &cli.command {
        Command::Mine(args) => mine(args, &settings, cli.json),
        Command::Predict(args) => predict(args, &settings, cli.json),
        Command::Encode(args) => encode(args, &settings, cli.json),
        Command::Decode(args) => decode(args, &settings, cli.json),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "smol_safe=info",
        1 => "smol_safe=debug",
        _ => "smol_safe=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn mine(args: &MineArgs, settings: &Settings, json: bool) -> Result<()> {
    args.validate().context("invalid mining options")?;
    let version = args.deployment.version(settings);
    let setup = args.setup.resolve(settings, version).context("invalid Safe setup")?;
    let deployment = args
        .deployment
        .resolve_required(settings)
        .context("invalid deployment")?;
    let pattern = args.pattern().context("invalid pattern")?;

    info!(
        pattern = %pattern,
        difficulty = %pattern.difficulty_description(),
        workers = args.worker_count(),
        target = args.count,
        factory = %deployment.factory,
        singleton = %deployment.singleton,
        owners = setup.owners.len(),
        threshold = setup.threshold,
        "Safe vanity search"
    );

    let pool = WorkerPool::new(
        args.worker_count(),
        pattern,
        deployment.search_target(&setup),
        args.seed,
    )
    .context("failed to start workers")?;

    let stop_flag = pool.stop_flag();
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    })
    .context("failed to set Ctrl-C handler")?;

    info!("Searching... (Press Ctrl+C to stop)");

    let mut found = 0;
    let report_interval = Duration::from_secs(args.report_interval);

    loop {
        match pool.wait_for_result(report_interval) {
            Some(result) => {
                found += 1;
                print_match(&result, found, &deployment, &setup, json)?;
                if args.count > 0 && found >= args.count {
                    info!("Target reached! Found {} address(es).", found);
                    break;
                }
            }
            None => log_progress(&pool),
        }
        if pool.is_stopped() {
            warn!("Stopped by user.");
            break;
        }
    }

    let progress = pool.progress();
    info!(
        salts = %format_number(progress.salts),
        matches = progress.matches,
        elapsed = %format!("{:.2}s", progress.elapsed.as_secs_f64()),
        speed = %format!("{}/s", format_number(progress.salts_per_second() as u64)),
        "final statistics"
    );

    pool.join();
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchReport<'a> {
    #[serde(flatten)]
    found: &'a VanityMatch,
    salt_nonce_hex: String,
    factory: smol_safe::Address,
    calldata: String,
}

fn print_match(
    result: &VanityMatch,
    index: usize,
    deployment: &SafeDeployment,
    setup: &SafeSetup,
    json: bool,
) -> Result<()> {
    let call = deployment.create_proxy_call(setup, result.salt_nonce);
    if json {
        let report = MatchReport {
            found: result,
            salt_nonce_hex: format!("0x{}", result.salt_nonce_hex()),
            factory: deployment.factory,
            calldata: format!("0x{}", hex::encode(call.encode())),
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("=== Match #{} ===", index);
    println!("Address:      {}", result.address_checksum());
    println!("Salt (dec):   {}", result.salt_nonce_decimal());
    println!("Salt (hex):   0x{}", result.salt_nonce_hex());
    println!("Worker:       {}", result.worker_id);
    println!("Factory:      {}", deployment.factory);
    println!("Calldata:     0x{}", hex::encode(call.encode()));
    println!();
    Ok(())
}

fn log_progress(pool: &WorkerPool) {
    let progress = pool.progress();
    info!(
        "[{:>4}s] Tried {} salts ({}/s)",
        progress.elapsed.as_secs(),
        format_number(progress.salts),
        format_number(progress.salts_per_second() as u64)
    );
}

fn predict(args: &PredictArgs, settings: &Settings, json: bool) -> Result<()> {
    let version = args.deployment.version(settings);
    let setup = args.setup.resolve(settings, version).context("invalid Safe setup")?;
    let deployment = args
        .deployment
        .resolve_required(settings)
        .context("invalid deployment")?;

    let address = deployment.predict(&setup, &args.salt_nonce);
    let call = deployment.create_proxy_call(&setup, args.salt_nonce);
    let initializer = setup.encode();

    if json {
        let out = json!({
            "address": address,
            "saltNonce": args.salt_nonce,
            "deployment": deployment,
            "initializer": format!("0x{}", hex::encode(&initializer)),
            "calldata": format!("0x{}", hex::encode(call.encode())),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Address:      {}", address);
    println!("Salt nonce:   {}", args.salt_nonce);
    println!("Factory:      {}", deployment.factory);
    println!("Singleton:    {}", deployment.singleton);
    println!("Initializer:  0x{}", hex::encode(&initializer));
    println!("Calldata:     0x{}", hex::encode(call.encode()));
    Ok(())
}

fn encode(args: &EncodeArgs, settings: &Settings, json: bool) -> Result<()> {
    let version = args.version.or(settings.safe_version).unwrap_or_default();
    let setup = args.setup.resolve(settings, version).context("invalid Safe setup")?;
    let initializer = setup.encode();

    if json {
        let out = json!({
            "setup": setup,
            "initializer": format!("0x{}", hex::encode(&initializer)),
            "initializerHash": format!("0x{}", hex::encode(setup.initializer_hash())),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("0x{}", hex::encode(&initializer));
    Ok(())
}

fn decode(args: &DecodeArgs, settings: &Settings, json: bool) -> Result<()> {
    let bytes = args.calldata_bytes().context("invalid calldata")?;
    let decoded = SafeCalldata::decode(&bytes).context("failed to decode calldata")?;
    let setup = decoded.setup().context("failed to decode embedded setup")?;

    let mut predicted = None;
    if let SafeCalldata::CreateProxy(call) = &decoded {
        // The singleton comes from the calldata; it also picks the preset
        // when none was given.
        let mut deployment_args = args.deployment.clone();
        deployment_args.singleton = Some(call.singleton);
        if settings.safe_version.is_none() {
            deployment_args.version = deployment_args
                .version
                .or_else(|| DeploymentVersion::from_singleton(call.singleton));
        }
        if let Some(deployment) = deployment_args.resolve(settings).context("invalid deployment")? {
            predicted = Some(deployment.predict_with_hash(&call.initializer_hash(), &call.salt_nonce));
        }
    }

    if json {
        let out = match &decoded {
            SafeCalldata::Setup(_) => json!({ "kind": "setup", "setup": setup }),
            SafeCalldata::CreateProxy(call) => json!({
                "kind": "createProxyWithNonce",
                "singleton": call.singleton,
                "saltNonce": call.salt_nonce,
                "setup": setup,
                "predictedAddress": predicted,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if let SafeCalldata::CreateProxy(call) = &decoded {
        println!("Singleton:        {}", call.singleton);
        println!("Salt nonce:       {}", call.salt_nonce);
    }
    println!("Threshold:        {} of {}", setup.threshold, setup.owners.len());
    for (i, owner) in setup.owners.iter().enumerate() {
        println!("Owner #{:<2}        {}", i + 1, owner);
    }
    println!("Fallback handler: {}", setup.fallback_handler);
    if !setup.to.is_zero() || !setup.data.is_empty() {
        println!("Setup call:       {} 0x{}", setup.to, hex::encode(&setup.data));
    }
    if setup.payment > 0 {
        println!(
            "Payment:          {} of {} to {}",
            setup.payment, setup.payment_token, setup.payment_receiver
        );
    }
    if let Some(address) = predicted {
        println!("Predicted:        {}", address);
    }
    Ok(())
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}
