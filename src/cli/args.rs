use clap::Parser;
use rust_decimal::Decimal;
use std::time::Duration;

/// Drive the card ledger with concurrent transfers
#[derive(Parser, Debug)]
#[command(name = "card-ledger")]
#[command(about = "Run a concurrent transfer simulation against the ledger core", long_about = None)]
pub struct SimArgs {
    /// Number of accounts to seed
    #[arg(
        long = "accounts",
        value_name = "COUNT",
        default_value_t = 8,
        help = "Number of accounts seeded in a ring"
    )]
    pub accounts: usize,

    /// Number of transfer requests to fire
    #[arg(
        long = "transfers",
        value_name = "COUNT",
        default_value_t = 1000,
        help = "Total number of transfer requests"
    )]
    pub transfers: usize,

    /// Number of concurrent workers
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Concurrent workers (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Amount moved by each transfer
    #[arg(
        long = "amount",
        value_name = "AMOUNT",
        default_value = "1.00",
        help = "Amount moved per transfer"
    )]
    pub amount: Decimal,

    /// Opening balance of every seeded account
    #[arg(
        long = "opening-balance",
        value_name = "AMOUNT",
        default_value = "1000.00",
        help = "Opening balance per account"
    )]
    pub opening_balance: Decimal,

    /// Bound on exclusive row-lock acquisition, in milliseconds
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        default_value_t = 5000,
        help = "Row-lock acquisition timeout in milliseconds"
    )]
    pub lock_timeout_ms: u64,
}

impl SimArgs {
    /// Effective worker count: the flag if set and non-zero, else CPU cores
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            Some(workers) if workers > 0 => workers,
            _ => num_cpus::get(),
        }
    }

    /// Row-lock timeout as a `Duration`
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
