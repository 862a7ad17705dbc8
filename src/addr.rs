/// A 24-bit CPU bus address split into bank and bank-local offset.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr {
    pub bank: u8,
    pub addr: u16,
}

impl Addr {
    pub const fn new(bank: u8, addr: u16) -> Self {
        Self { bank, addr }
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        let [addr @ .., bank] = bytes;
        Self {
            bank,
            addr: u16::from_le_bytes(addr),
        }
    }

    pub const fn to_u32(&self) -> u32 {
        let [lo, hi] = self.addr.to_le_bytes();
        u32::from_le_bytes([lo, hi, self.bank, 0])
    }

    pub const fn from_u32(n: u32) -> Self {
        let [bytes @ .., _] = n.to_le_bytes();
        Self::from_bytes(bytes)
    }

    /// Offset within the bank, wrapping at the bank boundary.
    pub const fn add16(mut self, val: u16) -> Self {
        self.addr = self.addr.wrapping_add(val);
        self
    }

    /// Branch destination of a near (8-bit) relative branch at `self`.
    pub const fn near_branch(self, offset: u8) -> Self {
        self.add16((offset as i8 as i16 as u16).wrapping_add(2))
    }

    /// Branch destination of a long (16-bit) relative branch at `self`.
    pub const fn long_branch(self, offset: u16) -> Self {
        self.add16(offset.wrapping_add(3))
    }
}

impl core::fmt::Display for Addr {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:02X}{:04X}", self.bank, self.addr)
    }
}

impl core::fmt::Debug for Addr {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:02x}:{:04x}", self.bank, self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_conversion() {
        let addr = Addr::from_u32(0xc0_8123);
        assert_eq!(addr, Addr::new(0xc0, 0x8123));
        assert_eq!(addr.to_u32(), 0xc0_8123);
        assert_eq!(Addr::from_u32(0xff_c0_8123), addr);
    }

    #[test]
    fn near_branch_stays_in_bank() {
        let pc = Addr::new(0x12, 0xfffe);
        assert_eq!(pc.near_branch(0x10), Addr::new(0x12, 0x0010));
        assert_eq!(Addr::new(0, 0x8000).near_branch(0xfe), Addr::new(0, 0x8000));
    }

    #[test]
    fn long_branch() {
        assert_eq!(Addr::new(0, 0x8000).long_branch(0), Addr::new(0, 0x8003));
        assert_eq!(
            Addr::new(3, 0x8000).long_branch(0xfffd),
            Addr::new(3, 0x8000)
        );
    }

    #[test]
    fn display_is_flat_hex() {
        assert_eq!(Addr::new(0x7e, 0x0010).to_string(), "7E0010");
    }
}
