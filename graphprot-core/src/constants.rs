// =============================================================================
// Encoding
// =============================================================================

/// Version string written into model files
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Smallest supported hash bit-width
pub const MIN_BITSIZE: u32 = 1;

/// Largest supported hash bit-width (dense weight vector of 2^24 f64)
pub const MAX_BITSIZE: u32 = 24;

/// Largest supported kernel radius or distance
pub const MAX_GRAPH_BOUND: u32 = 10;

/// Hash seed for vertex labels
pub const LABEL_HASH_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Hash seed for rooted neighborhood subgraphs
pub const NEIGHBORHOOD_HASH_SEED: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// Hash seed for neighborhood pairs (final feature codes)
pub const PAIR_HASH_SEED: u64 = 0x1656_67B1_9E37_79F9;

// =============================================================================
// Learning
// =============================================================================

/// Default kernel radius
pub const DEFAULT_RADIUS: u32 = 1;

/// Default kernel distance
pub const DEFAULT_DISTANCE: u32 = 4;

/// Default hash bit-width
pub const DEFAULT_BITSIZE: u32 = 14;

/// Default regularization strength
pub const DEFAULT_LAMBDA: f64 = 1e-4;

/// Default epsilon for the epsilon-insensitive loss
pub const DEFAULT_EPSILON: f64 = 0.1;

/// Default regression cost
pub const DEFAULT_COST: f64 = 1.0;

/// Default number of passes over the training data
pub const DEFAULT_EPOCHS: u32 = 10;

/// Bias updates use this fraction of the weight step size
pub const BIAS_LEARNING_RATE: f64 = 0.01;

/// Default seed for shuffling and fold assignment
pub const DEFAULT_SEED: u64 = 0x5EED;

// =============================================================================
// Model selection
// =============================================================================

/// Default number of cross-validation folds
pub const DEFAULT_FOLDS: usize = 10;

/// Default number of line-search sweeps over all dimensions
pub const DEFAULT_LINE_SEARCH_ROUNDS: usize = 2;

// =============================================================================
// Interpretation
// =============================================================================

/// Minimum flank on each side of a motif window
pub const MIN_MOTIF_FLANK: usize = 3;

/// Default number of top-scoring positions aggregated into motifs
pub const DEFAULT_MOTIF_TOP_K: usize = 1000;

/// Default percentile for high-affinity site selection
pub const DEFAULT_PERCENTILE: f64 = 99.0;

/// Placeholder written for window positions beyond the sequence edges
pub const WINDOW_PADDING: char = '-';
