use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use std::cell::RefCell;

// Nanosecond histograms up to one minute
const HISTOGRAM_MAX_NS: u64 = 60_000_000_000;

// Categories of timed operations
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    Pipeline,
    Capacity {
        subcategory: CapacityCalcType,
    },
    Emissions {
        subcategory: EmissionCalcType,
    },
    PowerFlow,
    FileIO {
        subcategory: FileIOType,
    },
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum CapacityCalcType {
    CapacityFactor,
    CapacityShare,
    Projection,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum EmissionCalcType {
    Factors,
    Aggregation,
    Intensity,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum FileIOType {
    DataLoad,
    ResultsSave,
    Other,
}

impl OperationCategory {
    pub fn as_str(&self) -> String {
        match self {
            OperationCategory::Pipeline => "Pipeline".to_string(),
            OperationCategory::Capacity { subcategory } => {
                format!("Capacity - {}", match subcategory {
                    CapacityCalcType::CapacityFactor => "Capacity Factor",
                    CapacityCalcType::CapacityShare => "Capacity Share",
                    CapacityCalcType::Projection => "Projection",
                })
            },
            OperationCategory::Emissions { subcategory } => {
                format!("Emissions - {}", match subcategory {
                    EmissionCalcType::Factors => "Factors",
                    EmissionCalcType::Aggregation => "Aggregation",
                    EmissionCalcType::Intensity => "Intensity",
                })
            },
            OperationCategory::PowerFlow => "Power Flow".to_string(),
            OperationCategory::FileIO { subcategory } => {
                format!("File I/O - {}", match subcategory {
                    FileIOType::DataLoad => "Data Load",
                    FileIOType::ResultsSave => "Results Save",
                    FileIOType::Other => "Other",
                })
            },
            OperationCategory::Other => "Other Operations".to_string(),
        }
    }
}

thread_local! {
    static TIMING_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTION_TIMINGS: Arc<RwLock<HashMap<String, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref CATEGORY_TIMINGS: Arc<RwLock<HashMap<OperationCategory, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    // name -> (total, calls, callers)
    static ref CALL_TREE: Arc<RwLock<HashMap<String, (Duration, usize, Vec<String>)>>> = Arc::new(RwLock::new(HashMap::new()));
}

fn new_histogram() -> Histogram<u64> {
    Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, 3).expect("constant histogram bounds are valid")
}

/// Records elapsed time for `function_name` when dropped.
pub struct TimingGuard {
    function_name: String,
    category: OperationCategory,
    start: Instant,
    tracked: bool,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.tracked {
            record_timing_end(&self.function_name, self.start.elapsed(), &self.category);
        }
    }
}

pub fn start_timing(function_name: &str, category: OperationCategory) -> TimingGuard {
    let tracked = is_timing_enabled();
    if tracked {
        TIMING_STACK.with(|stack| stack.borrow_mut().push(function_name.to_string()));
    }

    TimingGuard {
        function_name: function_name.to_string(),
        category,
        start: Instant::now(),
        tracked,
    }
}

fn record_timing_end(function_name: &str, duration: Duration, category: &OperationCategory) {
    let duration_ns = duration.as_nanos() as u64;

    TIMING_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.pop();

        let mut tree = CALL_TREE.write();
        let entry = tree
            .entry(function_name.to_string())
            .or_insert((Duration::from_nanos(0), 0, Vec::new()));
        entry.0 += duration;
        entry.1 += 1;

        if let Some(parent_name) = stack.last() {
            if !entry.2.contains(parent_name) {
                entry.2.push(parent_name.clone());
            }
        }
    });

    {
        let mut timings = FUNCTION_TIMINGS.write();
        let histogram = timings
            .entry(function_name.to_string())
            .or_insert_with(new_histogram);
        let _ = histogram.record(duration_ns);
    }

    {
        let mut category_timings = CATEGORY_TIMINGS.write();
        let histogram = category_timings
            .entry(category.clone())
            .or_insert_with(new_histogram);
        let _ = histogram.record(duration_ns);
    }
}

/// Install the global subscriber. `RUST_LOG` directives are honoured on top
/// of the `info` default.
pub fn init_logging(enable_timing: bool, debug: bool) -> anyhow::Result<()> {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let mut env_filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if debug {
        env_filter = env_filter.add_directive("gridintensity=debug".parse()?);
    }

    if enable_timing {
        let timing_layer = Builder::default().layer(new_histogram);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .with(timing_layer.boxed());

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact());

        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\nTiming Report");
    println!("=============");

    println!("\nBy Function:");
    println!("------------");
    let tree = CALL_TREE.read();
    let mut entries: Vec<_> = tree.iter().collect();
    entries.sort_by(|a, b| b.1.0.cmp(&a.1.0));

    for (function_name, (total_duration, count, parents)) in entries {
        let avg_duration = total_duration.div_f64(*count as f64);
        println!(
            "{}: total={:.3}s, count={}, avg={:.2}ms{}",
            function_name,
            total_duration.as_secs_f64(),
            count,
            avg_duration.as_secs_f64() * 1000.0,
            if !parents.is_empty() {
                format!("\n  Called by: {}", parents.join(", "))
            } else {
                String::new()
            }
        );
    }

    println!("\nBy Category:");
    println!("------------");
    let category_timings = CATEGORY_TIMINGS.read();
    let mut category_vec: Vec<_> = category_timings.iter().collect();
    category_vec.sort_by(|a, b| {
        let b_total = b.1.mean() * b.1.len() as f64;
        let a_total = a.1.mean() * a.1.len() as f64;
        b_total.partial_cmp(&a_total).unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_time: f64 = category_vec.iter()
        .map(|(_, hist)| hist.mean() * (hist.len() as f64))
        .sum();

    for (category, histogram) in category_vec {
        let category_total = histogram.mean() * (histogram.len() as f64);
        let percentage = if total_time > 0.0 { category_total / total_time * 100.0 } else { 0.0 };
        println!(
            "{}: {:.1}% of total time\n  mean={:.2}ms, p95={:.2}ms, count={}, total={:.3}s",
            category.as_str(),
            percentage,
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
            histogram.len(),
            category_total / 1_000_000_000.0,
        );
    }

    println!("=============\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_include_subcategory() {
        let category = OperationCategory::Capacity { subcategory: CapacityCalcType::Projection };
        assert_eq!(category.as_str(), "Capacity - Projection");
        assert_eq!(OperationCategory::PowerFlow.as_str(), "Power Flow");
    }

    #[test]
    fn guard_without_timing_leaves_stack_untouched() {
        if is_timing_enabled() {
            return;
        }
        let guard = start_timing("noop", OperationCategory::Other);
        assert!(!guard.tracked);
        drop(guard);
        TIMING_STACK.with(|stack| assert!(stack.borrow().is_empty()));
    }
}
