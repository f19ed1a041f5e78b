//! Card Ledger simulation driver
//!
//! Seeds a ring of accounts and hammers the transfer executor from many
//! concurrent workers, then reports outcome counts, throughput, and the
//! balance-conservation check.
//!
//! # Usage
//!
//! ```bash
//! cargo run
//! cargo run -- --accounts 16 --transfers 10000 --workers 8
//! cargo run -- --amount 250.00 --opening-balance 1000.00
//! RUST_LOG=card_ledger=debug cargo run
//! ```
//!
//! Every request is well-formed (the requester always owns the source
//! account), so the only expected failures are insufficient funds once a
//! ring account runs dry and, under extreme contention, lock timeouts.
//!
//! # Exit Codes
//!
//! - 0: Simulation ran and the total balance was conserved
//! - 1: Seeding failed or the conservation check did not hold

use card_ledger::cli;
use card_ledger::{
    AccountId, AccountService, AccountStore, Clock, ErrorKind, OwnerId, SystemClock,
    TransferExecutor, TransferLog,
};
use chrono::Months;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::process;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Per-worker tally of transfer outcomes
#[derive(Debug, Default)]
struct Outcomes {
    committed: usize,
    failed: BTreeMap<&'static str, usize>,
}

impl Outcomes {
    fn record_failure(&mut self, kind: ErrorKind) {
        let label = match kind {
            ErrorKind::NotFound => "not-found",
            ErrorKind::InvalidOperation => "invalid-operation",
            ErrorKind::PreconditionFailed => "precondition-failed",
            ErrorKind::AuthorizationFailed => "authorization-failed",
            ErrorKind::InsufficientFunds => "insufficient-funds",
            ErrorKind::ConcurrentModification => "concurrent-modification",
            ErrorKind::Internal => "internal",
        };
        *self.failed.entry(label).or_insert(0) += 1;
    }

    fn merge(&mut self, other: Outcomes) {
        self.committed += other.committed;
        for (label, count) in other.failed {
            *self.failed.entry(label).or_insert(0) += count;
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = cli::parse_args();
    if args.accounts == 0 {
        eprintln!("Error: --accounts must be at least 1");
        process::exit(1);
    }
    let workers = args.effective_workers();

    let clock = Arc::new(SystemClock);
    let store = Arc::new(AccountStore::with_lock_timeout(args.lock_timeout()));
    let log = Arc::new(TransferLog::new());
    let service = AccountService::new(Arc::clone(&store), clock.clone());
    let executor = TransferExecutor::new(Arc::clone(&store), Arc::clone(&log), clock.clone());

    // Seed the ring: account i transfers to account i + 1 (mod n), so the
    // ring also produces opposite-direction pairs at the wrap-around.
    let expiry = clock
        .now()
        .date_naive()
        .checked_add_months(Months::new(36))
        .unwrap_or_else(|| clock.now().date_naive());
    let mut ids: Vec<AccountId> = Vec::with_capacity(args.accounts);
    let mut owners: Vec<OwnerId> = Vec::with_capacity(args.accounts);
    for i in 0..args.accounts {
        let owner = OwnerId::new();
        let number = format!("4000 0000 0000 {:04}", i % 10_000);
        match service.open(owner, &number, expiry, args.opening_balance) {
            Ok(account) => {
                ids.push(account.id);
                owners.push(owner);
            }
            Err(e) => {
                eprintln!("Error: failed to seed account {}: {}", i, e);
                process::exit(1);
            }
        }
    }

    let before: Decimal = store.snapshot().await.iter().map(|a| a.balance).sum();
    let started = Instant::now();

    let ids = Arc::new(ids);
    let owners = Arc::new(owners);
    let mut tasks = Vec::with_capacity(workers);
    for worker in 0..workers {
        let executor = executor.clone();
        let ids = Arc::clone(&ids);
        let owners = Arc::clone(&owners);
        let transfers = args.transfers;
        let amount = args.amount;
        tasks.push(tokio::spawn(async move {
            let mut outcomes = Outcomes::default();
            let n = ids.len();
            for i in (worker..transfers).step_by(workers.max(1)) {
                let source = i % n;
                let dest = (i + 1) % n;
                match executor
                    .execute(ids[source], ids[dest], amount, owners[source])
                    .await
                {
                    Ok(_) => outcomes.committed += 1,
                    Err(e) => outcomes.record_failure(e.kind()),
                }
            }
            outcomes
        }));
    }

    let mut totals = Outcomes::default();
    for joined in join_all(tasks).await {
        match joined {
            Ok(outcomes) => totals.merge(outcomes),
            Err(e) => {
                eprintln!("Error: worker task failed: {}", e);
                process::exit(1);
            }
        }
    }

    let elapsed = started.elapsed();
    let after: Decimal = store.snapshot().await.iter().map(|a| a.balance).sum();

    println!("accounts            {}", args.accounts);
    println!("workers             {}", workers);
    println!("requests            {}", args.transfers);
    println!("committed           {}", totals.committed);
    for (label, count) in &totals.failed {
        println!("failed ({:<22}) {}", label, count);
    }
    println!("receipts logged     {}", log.len());
    println!("total balance       {} -> {}", before, after);
    println!(
        "elapsed             {:.3}s ({:.0} transfers/s)",
        elapsed.as_secs_f64(),
        totals.committed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    if before != after {
        eprintln!("Error: total balance not conserved");
        process::exit(1);
    }
    if log.len() != totals.committed {
        eprintln!("Error: receipt count does not match committed transfers");
        process::exit(1);
    }
}
