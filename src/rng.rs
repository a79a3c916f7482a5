use rand::RngCore;

/// Source of the random bytes consumed by `Cxkk`.
pub trait RandomByte {
    fn random_byte(&mut self) -> u8;
}

impl<R: RngCore> RandomByte for R {
    fn random_byte(&mut self) -> u8 {
        (self.next_u32() & 0xff) as u8
    }
}
