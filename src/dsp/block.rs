/// Frames per render quantum.
pub const BLOCK_SIZE: usize = 128;

/// One render quantum of stereo output, samples in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    pub left: [f32; BLOCK_SIZE],
    pub right: [f32; BLOCK_SIZE],
}

impl Default for SampleBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBlock {
    pub fn new() -> Self {
        SampleBlock {
            left: [0.0; BLOCK_SIZE],
            right: [0.0; BLOCK_SIZE],
        }
    }

    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    pub fn is_silent(&self) -> bool {
        self.left.iter().chain(self.right.iter()).all(|&s| s == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_is_silent() {
        let mut block = SampleBlock::new();
        assert!(block.is_silent());
        block.right[BLOCK_SIZE - 1] = 0.1;
        assert!(!block.is_silent());
        block.clear();
        assert!(block.is_silent());
    }
}
