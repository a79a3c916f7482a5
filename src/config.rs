/// Driver settings. The machine itself has no knobs; these only control how
/// fast the driver runs it and for how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// instruction steps per second of wall-clock time
    pub instructions_per_second: u32,
    /// timer ticks per second
    pub timer_hz: u32,
    /// seed for the `Cxkk` random source; entropy if None
    pub seed: Option<u64>,
    /// stop after this many instruction steps; run until quit if None
    pub max_cycles: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: 700,
            timer_hz: 60,
            seed: None,
            max_cycles: None,
        }
    }
}
