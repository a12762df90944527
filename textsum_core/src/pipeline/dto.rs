/// Decoding settings applied to every prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub length_penalty: f64,
    pub num_beams: usize,
    pub max_length: usize,
}

pub const GENERATION_PARAMS: GenerationParams = GenerationParams {
    length_penalty: 0.8,
    num_beams: 8,
    max_length: 128,
};

impl Default for GenerationParams {
    fn default() -> Self {
        GENERATION_PARAMS
    }
}
