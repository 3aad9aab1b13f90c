//! # curvesale-cli
//!
//! Offline quoting against a sale configuration file. No ledger or host is
//! involved: every command takes the number of units already sold as input
//! and answers from the curve alone.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use curvesale_admission::AdmissionController;
use curvesale_pricing::PricingEngine;
use curvesale_types::{SaleConfig, units};
use serde_json::json;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "curvesale")]
#[command(about = "Quote a linear bonding-curve sale", version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Sale configuration (JSON)
    #[arg(short, long, global = true, default_value = "./sale.json")]
    pub config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price of the next unit
    Price {
        /// Whole units already sold
        #[arg(short, long, default_value_t = 0)]
        sold: u128,
    },

    /// Units, cost and refund for a payment
    QuoteBuy {
        #[arg(short, long, default_value_t = 0)]
        sold: u128,

        /// Payment in value units (e.g. 1.5)
        #[arg(short, long)]
        payment: String,
    },

    /// Payout for selling units back
    QuoteSell {
        #[arg(short, long)]
        sold: u128,

        /// Whole units to sell
        #[arg(short, long)]
        quantity: u128,
    },

    /// Sale phase at a point in time
    Phase {
        /// RFC 3339 timestamp; defaults to now
        #[arg(short, long)]
        at: Option<DateTime<Utc>>,
    },
}

/// Load the configuration and run `cli.command`.
pub fn execute(cli: &Cli) -> anyhow::Result<String> {
    let config = SaleConfig::from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    debug!(path = %cli.config.display(), "Configuration loaded");
    render(&cli.command, &config, cli.json)
}

/// Run `command` against an already loaded configuration.
///
/// JSON output carries amounts as strings; base-unit integers outgrow JSON
/// numbers.
pub fn render(command: &Command, config: &SaleConfig, as_json: bool) -> anyhow::Result<String> {
    let engine = PricingEngine::from_config(config)?;

    match command {
        Command::Price { sold } => {
            let price = engine.current_price(*sold)?;
            let remaining = engine.remaining(*sold)?;
            let price = units::format_value(price)?;
            Ok(if as_json {
                json!({
                    "sold": sold.to_string(),
                    "remaining": remaining.to_string(),
                    "price": price.to_string(),
                })
                .to_string()
            } else {
                format!("price {price} ({remaining} units remaining)")
            })
        }
        Command::QuoteBuy { sold, payment } => {
            let budget = units::parse_value_str(payment)?;
            let quote = engine.quote_buy(*sold, budget)?;
            let cost = units::format_value(quote.cost)?;
            let refund = units::format_value(quote.refund)?;
            Ok(if as_json {
                json!({
                    "quantity": quote.quantity.to_string(),
                    "cost": cost.to_string(),
                    "refund": refund.to_string(),
                })
                .to_string()
            } else {
                format!("{} units for {cost}, refund {refund}", quote.quantity)
            })
        }
        Command::QuoteSell { sold, quantity } => {
            let payout = units::format_value(engine.payout_for_quantity(*sold, *quantity)?)?;
            Ok(if as_json {
                json!({ "quantity": quantity.to_string(), "payout": payout.to_string() }).to_string()
            } else {
                format!("{quantity} units pay out {payout}")
            })
        }
        Command::Phase { at } => {
            let gate = AdmissionController::from_config(config)?;
            let at = at.unwrap_or_else(Utc::now);
            let phase = gate.phase_at(at);
            Ok(if as_json {
                json!({ "at": at.to_rfc3339(), "phase": phase.to_string() }).to_string()
            } else {
                format!("{phase} at {}", at.to_rfc3339())
            })
        }
    }
}
