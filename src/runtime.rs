//! Execution context for the parallel numeric kernels

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// How the execution context is set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextOptions {
    /// Run inside a dedicated thread pool instead of the global one
    pub pooled: bool,

    /// Worker threads for a dedicated pool (0 = use all available cores)
    pub threads: usize,
}

/// A (re)initializable home for parallel work.
///
/// Every call to `reinitialize` builds a fresh context; dropping it tears
/// the dedicated pool down.
pub struct ExecutionContext {
    options: ContextOptions,
    pool: Option<ThreadPool>,
}

impl ExecutionContext {
    pub fn reinitialize(options: ContextOptions) -> Result<Self> {
        let pool = if options.pooled {
            let threads = if options.threads > 0 {
                options.threads
            } else {
                num_cpus::get()
            };
            let pool = ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("cut-worker-{}", i))
                .build()?;
            log::debug!("Initialized dedicated pool with {} threads", threads);
            Some(pool)
        } else {
            None
        };

        Ok(Self { options, pool })
    }

    pub fn is_initialized(&self) -> bool {
        !self.options.pooled || self.pool.is_some()
    }

    pub fn options(&self) -> ContextOptions {
        self.options
    }

    /// Threads available to work run through `install`
    pub fn current_num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Run `op` inside this context
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}
