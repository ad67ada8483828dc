//! Shared fixtures: a single small cache and a short size sweep keep each
//! evaluation in the microsecond range.

use bias_core::{CacheMode, HardwareSpecConfig, SimulationConfig};
use bias_evolve::EvolutionConfig;

pub fn small_config() -> EvolutionConfig {
    EvolutionConfig {
        population_limit: 60,
        initial_population: 20,
        workers: 2,
        groom_period_ms: 20,
        monitor_period_ms: 5,
        fresh_per_groom: 4,
        hill_climb_top: 2,
        cache: CacheMode::Sparse,
        simulation: SimulationConfig {
            max_magnitude: 12,
            ..SimulationConfig::default()
        },
        hardware: vec![HardwareSpecConfig {
            description: "16 sets, 64 byte lines".to_string(),
            number_of_sets: 16,
            block_size_in_bytes: 64,
            min_array_size_in_bytes: 4096,
        }],
        ..EvolutionConfig::default()
    }
}
