// World defaults
pub const DEFAULT_SEED: u64 = 42;
pub const CHUNK_SIZE: u32 = 16;
pub const MAX_CHUNK_SIDE: u32 = 1024;
pub const MAX_RESIDENT_CHUNKS: u32 = 512;
pub const VIEW_DISTANCE: u32 = 6;
pub const CHUNK_UNLOAD_DISTANCE: u32 = 8;

// Height octaves (fractal sum, frequency doubles and amplitude halves per octave)
pub const HEIGHT_OCTAVES: u32 = 5;
pub const HEIGHT_BASE_FREQUENCY: f64 = 1.0 / 256.0;
pub const MOISTURE_OCTAVES: u32 = 3;
pub const MOISTURE_BASE_FREQUENCY: f64 = 1.0 / 512.0;
pub const FRACTAL_LACUNARITY: f64 = 2.0;
pub const FRACTAL_GAIN: f64 = 0.5;

// Salt mixed into the world seed for the independent moisture channel
pub const MOISTURE_SEED_SALT: u64 = 0x6d6f_6973_7475_7265;

// Biome thresholds, heights and moistures are normalized to [0, 1]
pub const SEA_LEVEL: f32 = 0.35;
pub const BEACH_LEVEL: f32 = 0.40;
pub const MOUNTAIN_LEVEL: f32 = 0.75;
pub const TUNDRA_MOISTURE: f32 = 0.55;
pub const FOREST_MOISTURE: f32 = 0.50;

// Scheduling
pub const ASYNC_WORKER_COUNT: usize = 4;
pub const MAX_COMPLETIONS_PER_TICK: usize = 64;
pub const FAILED_RETRY_COOLDOWN_TICKS: u64 = 120;
