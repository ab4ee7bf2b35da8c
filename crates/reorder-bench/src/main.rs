use std::io;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use tab_wrangler::host::FaultRule;
use tab_wrangler::{MemoryHost, Reconciler, TabId, WindowId};

const WINDOW: WindowId = WindowId(1);

#[derive(Parser, Debug)]
#[command(
    name = "reorder-bench",
    version = env!("CARGO_PKG_VERSION"),
    about = "Reorder random permutations and report move counts and throughput"
)]
struct BenchCli {
    /// Tabs in the simulated window.
    #[arg(short = 't', long = "tabs", value_name = "COUNT", default_value_t = 50)]
    tabs: usize,

    /// Number of random reorders to run.
    #[arg(
        short = 'i',
        long = "iterations",
        value_name = "COUNT",
        default_value_t = 1000
    )]
    iterations: u64,

    /// Fixed seed for repeatable runs. Defaults to the clock.
    #[arg(short = 's', long = "seed", value_name = "SEED")]
    seed: Option<u64>,

    /// Percentage of tabs whose moves are rejected by the host.
    #[arg(long = "reject-percent", value_name = "PERCENT", default_value_t = 0)]
    reject_percent: u32,
}

struct BenchConfig {
    tabs: usize,
    iterations: u64,
    seed: u64,
    reject_percent: u32,
}

impl TryFrom<&BenchCli> for BenchConfig {
    type Error = String;

    fn try_from(cli: &BenchCli) -> Result<Self, Self::Error> {
        if !(2..=10_000).contains(&cli.tabs) {
            return Err("tabs must be between 2 and 10000".to_string());
        }
        if !(1..=1_000_000).contains(&cli.iterations) {
            return Err("iterations must be between 1 and 1000000".to_string());
        }
        if cli.reject_percent > 100 {
            return Err("reject-percent must be between 0 and 100".to_string());
        }
        Ok(Self {
            tabs: cli.tabs,
            iterations: cli.iterations,
            seed: cli.seed.unwrap_or_else(clock_seed),
            reject_percent: cli.reject_percent,
        })
    }
}

fn main() -> io::Result<()> {
    let args = BenchCli::parse();
    let config = BenchConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let stats = run_benchmark(&config);
    println!("{}", stats.final_report(&config));
    Ok(())
}

fn run_benchmark(config: &BenchConfig) -> BenchStats {
    let mut stats = BenchStats::new();
    let mut noise = Noise::new(config.seed);
    let start: Vec<TabId> = (0..config.tabs as u32).map(TabId).collect();

    for _ in 0..config.iterations {
        let mut host = MemoryHost::new().with_window(WINDOW, start.clone());
        for tab in &start {
            if noise.below(100) < config.reject_percent {
                host.add_fault(FaultRule::Reject(*tab));
            }
        }
        let mut desired = start.clone();
        noise.shuffle(&mut desired);

        let began = Instant::now();
        let report = Reconciler::new(&mut host).reorder_within_window(WINDOW, &[], &desired);
        let elapsed = began.elapsed();

        let converged = host.order(WINDOW) == Some(desired.as_slice());
        stats.record(report.issued as u64, report.failed() as u64, converged, elapsed);
    }

    stats.mark_completed();
    stats
}

struct BenchStats {
    start: Instant,
    completed_at: Option<Instant>,
    runs: u64,
    moves: u64,
    failures: u64,
    converged: u64,
    fewest_moves: u64,
    most_moves: u64,
    total_time: Duration,
    slowest_run: Duration,
}

impl BenchStats {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            completed_at: None,
            runs: 0,
            moves: 0,
            failures: 0,
            converged: 0,
            fewest_moves: u64::MAX,
            most_moves: 0,
            total_time: Duration::ZERO,
            slowest_run: Duration::ZERO,
        }
    }

    fn elapsed(&self) -> Duration {
        match self.completed_at {
            Some(done) => done.duration_since(self.start),
            None => self.start.elapsed(),
        }
    }

    fn mark_completed(&mut self) {
        self.completed_at = Some(Instant::now());
    }

    fn record(&mut self, moves: u64, failures: u64, converged: bool, elapsed: Duration) {
        self.runs = self.runs.saturating_add(1);
        self.moves = self.moves.saturating_add(moves);
        self.failures = self.failures.saturating_add(failures);
        if converged {
            self.converged += 1;
        }
        self.fewest_moves = self.fewest_moves.min(moves);
        self.most_moves = self.most_moves.max(moves);
        self.total_time += elapsed;
        if elapsed > self.slowest_run {
            self.slowest_run = elapsed;
        }
    }

    fn average_moves(&self) -> f64 {
        if self.runs == 0 {
            return 0.0;
        }
        self.moves as f64 / self.runs as f64
    }

    fn average_run_us(&self) -> f64 {
        if self.runs == 0 {
            return 0.0;
        }
        (self.total_time.as_secs_f64() / self.runs as f64) * 1_000_000.0
    }

    fn final_report(&self, config: &BenchConfig) -> String {
        let elapsed = self.elapsed().as_secs_f64();
        let runs_per_second = if elapsed > 0.0 {
            self.runs as f64 / elapsed
        } else {
            0.0
        };

        indoc::formatdoc!(
            r#"
            Reorder bench completed (seed {seed}).
            Tabs: {tabs} | Runs: {runs} (~{rps:.0}/s)
            Moves per run: avg {avg:.2} | min {min} | max {max} (bound {bound})
            Failed moves: {failures} | Converged: {converged}/{runs}
            Avg run: {avg_us:.1} us | Worst: {worst_us:.1} us
            "#,
            seed = config.seed,
            tabs = config.tabs,
            runs = self.runs,
            rps = runs_per_second,
            avg = self.average_moves(),
            min = if self.runs == 0 { 0 } else { self.fewest_moves },
            max = self.most_moves,
            bound = config.tabs - 1,
            failures = self.failures,
            converged = self.converged,
            avg_us = self.average_run_us(),
            worst_us = self.slowest_run.as_secs_f64() * 1_000_000.0,
        )
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
        ^ 0xA5A5_A5A5_1234_5678
}

/// Linear congruential generator; plenty for shuffling.
struct Noise {
    state: u64,
}

impl Noise {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn below(&mut self, bound: u32) -> u32 {
        self.next() % bound
    }

    /// Fisher-Yates.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}
