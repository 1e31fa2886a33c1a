//! Engine options.

/// Capacity class of the neighbor-deduction probe table. Values of
/// `deduce_neighbors` above this fall back to the default.
pub const DEDUCE_TABLE_SIZE: usize = 310;

/// Default for `deduce_neighbors`.
pub const DEFAULT_DEDUCE_NEIGHBORS: usize = DEDUCE_TABLE_SIZE / 10;

/// Tunables of a comparison run. Constructed with [`Options::default`]
/// and adjusted through [`Engine::set_option`].
///
/// [`Engine::set_option`]: crate::engine::Engine::set_option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Emit detailed progress events while matching.
    pub trace: bool,
    /// Fold case when hashing and comparing net and equivalence names.
    /// Must be decided before ingestion starts.
    pub ignore_case: bool,
    /// Allow name-suffix pairing when guessing a match inside a small
    /// ambiguous section of nets.
    pub use_suffix: bool,
    /// Local neighbor deduction runs only for matched pairs with fewer
    /// neighbors than this. 0 disables deduction entirely.
    pub deduce_neighbors: usize,
    /// Stop refining once fewer vertices than this remain unmatched.
    /// The default of 0 never triggers.
    pub error_cutoff: usize,
    /// Number of stalled refinement rounds to sit through before forcing
    /// a guessed match. 0 forces on the first stall.
    pub suspect_cutoff: i32,
    /// Consecutive zero-progress passes that end a distillation cycle.
    pub no_progress_cutoff: u32,
    /// Deduce matches from the neighbors of matched pairs.
    pub find_match: bool,
    /// Recompute every pending vertex each pass instead of only the
    /// frontier. Incompatible with `find_match`.
    pub no_opt: bool,
    /// Report nets with no connections as they are dropped.
    pub print_zero_nets: bool,
    /// Only describe a net's connections in trace output when it has at
    /// most this many.
    pub net_print_limit: usize,
    /// Verbose vertex descriptions in trace output.
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            trace: false,
            ignore_case: false,
            use_suffix: true,
            deduce_neighbors: DEFAULT_DEDUCE_NEIGHBORS,
            error_cutoff: 0,
            suspect_cutoff: 0,
            no_progress_cutoff: 2,
            find_match: true,
            no_opt: false,
            print_zero_nets: true,
            net_print_limit: 10,
            verbose: false,
        }
    }
}

/// One option assignment, consumed by [`Engine::set_option`].
///
/// [`Engine::set_option`]: crate::engine::Engine::set_option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opt {
    Trace(bool),
    IgnoreCase(bool),
    UseSuffix(bool),
    DeduceNeighbors(usize),
    ErrorCutoff(usize),
    SuspectCutoff(i32),
    NoProgressCutoff(u32),
    FindMatch(bool),
    NoOpt(bool),
    PrintZeroNets(bool),
    NetPrintLimit(usize),
    Verbose(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let opts = Options::default();
        assert!(!opts.trace);
        assert!(opts.use_suffix);
        assert!(opts.find_match);
        assert_eq!(opts.deduce_neighbors, 31);
        assert_eq!(opts.suspect_cutoff, 0);
        assert_eq!(opts.no_progress_cutoff, 2);
        assert_eq!(opts.error_cutoff, 0);
        assert_eq!(opts.net_print_limit, 10);
    }
}
