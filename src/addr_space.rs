use crate::addr::Addr;
use serde::{Deserialize, Serialize};

/// Memory region of the console, numbered the way the annotation store joins on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum Region {
    #[serde(rename = "ROM")]
    Rom = 1,
    #[serde(rename = "WRAM")]
    Wram = 2,
    #[serde(rename = "SRAM")]
    Sram = 3,
    #[serde(rename = "VRAM")]
    Vram = 4,
    #[serde(rename = "REG")]
    Register = 5,
}

impl Region {
    pub const ALL: [Self; 5] = [
        Self::Rom,
        Self::Wram,
        Self::Sram,
        Self::Vram,
        Self::Register,
    ];

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|region| region.id() == id)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rom => "ROM",
            Self::Wram => "WRAM",
            Self::Sram => "SRAM",
            Self::Vram => "VRAM",
            Self::Register => "REG",
        }
    }
}

impl core::fmt::Display for Region {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|region| region.name().eq_ignore_ascii_case(s))
            .or_else(|| s.parse().ok().and_then(Self::from_id))
            .ok_or_else(|| format!("unknown region `{s}`"))
    }
}

/// An address inside one region. Also identifies a disassembly source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location {
    pub region: Region,
    pub address: u32,
}

impl Location {
    pub const fn new(region: Region, address: u32) -> Self {
        Self { region, address }
    }

    pub const fn rom(address: u32) -> Self {
        Self::new(Region::Rom, address)
    }

    pub const fn wram(address: u32) -> Self {
        Self::new(Region::Wram, address)
    }

    pub const fn bank(self) -> u32 {
        self.address & 0xff_0000
    }

    pub const fn offset(self, n: u32) -> Self {
        Self::new(self.region, self.address.wrapping_add(n))
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}:{:06X}", self.region, self.address)
    }
}

impl core::fmt::Debug for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl core::str::FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (region, address) = s
            .split_once(':')
            .ok_or_else(|| format!("expected REGION:ADDRESS, got `{s}`"))?;
        let address = address.trim().trim_start_matches("0x").trim_start_matches('$');
        let address = u32::from_str_radix(address, 16)
            .map_err(|err| format!("bad address `{address}`: {err}"))?;
        Ok(Self::new(region.parse()?, address))
    }
}

impl TryFrom<String> for Location {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.to_string()
    }
}

fn is_system_bank(bank: u8) -> bool {
    matches!(bank, 0x00..=0x3f | 0x80..=0xbf)
}

/// Maps a flat 24-bit bus address onto the region that backs it.
///
/// Returns `None` for open bus and other windows that are not modelled.
pub fn translate(flat: u32) -> Option<Location> {
    let addr = Addr::from_u32(flat);
    let flat = addr.to_u32();
    let page = addr.addr as u32;
    if is_system_bank(addr.bank) {
        match addr.addr {
            // PPU, APU, WRAM port, joypad, CPU and DMA registers
            0x2100..=0x213f
            | 0x2140..=0x217f
            | 0x2180..=0x2183
            | 0x4016..=0x4017
            | 0x4200..=0x421f
            | 0x4300..=0x437f => return Some(Location::new(Region::Register, page)),
            0x0000..=0x1fff => return Some(Location::wram(page)),
            _ => {}
        }
    }
    Some(match (addr.bank, addr.addr) {
        (0x7e..=0x7f, _) => Location::wram(flat - 0x7e_0000),
        (0x00..=0x3f, 0x8000..=0xffff) => Location::rom(flat),
        (0x80..=0xbf, 0x8000..=0xffff) => Location::rom(flat - 0x80_0000),
        (0x40..=0x7d, _) => Location::rom(flat - 0x40_0000),
        (0xc0..=0xff, _) => Location::rom(flat - 0xc0_0000),
        (0x20..=0x3f | 0xa0..=0xbf, 0x6000..=0x7fff) => {
            Location::new(Region::Sram, (flat - 0x6000) & 0xffff)
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x00_2100, Some(Location::new(Region::Register, 0x2100)))]
    #[case(0x80_2140, Some(Location::new(Region::Register, 0x2140)))]
    #[case(0x00_2183, Some(Location::new(Region::Register, 0x2183)))]
    #[case(0x00_4016, Some(Location::new(Region::Register, 0x4016)))]
    #[case(0xbf_420b, Some(Location::new(Region::Register, 0x420b)))]
    #[case(0x00_4375, Some(Location::new(Region::Register, 0x4375)))]
    #[case(0x00_0010, Some(Location::wram(0x0010)))]
    #[case(0x80_1fff, Some(Location::wram(0x1fff)))]
    #[case(0x7e_2000, Some(Location::wram(0x2000)))]
    #[case(0x7f_0010, Some(Location::wram(0x1_0010)))]
    #[case(0x01_8000, Some(Location::rom(0x01_8000)))]
    #[case(0x81_8000, Some(Location::rom(0x01_8000)))]
    #[case(0x40_1234, Some(Location::rom(0x00_1234)))]
    #[case(0xc3_5678, Some(Location::rom(0x03_5678)))]
    #[case(0x30_6010, Some(Location::new(Region::Sram, 0x0010)))]
    #[case(0xa0_7fff, Some(Location::new(Region::Sram, 0x1fff)))]
    #[case(0x00_2000, None)]
    #[case(0x00_4400, None)]
    #[case(0x10_6000, None)]
    fn translate_windows(#[case] flat: u32, #[case] expected: Option<Location>) {
        assert_eq!(translate(flat), expected);
    }

    #[test]
    fn translate_ignores_high_byte() {
        assert_eq!(translate(0xff_c0_8000), translate(0xc0_8000));
    }

    #[test]
    fn location_text_form() {
        let loc: Location = "ROM:c08000".parse().unwrap();
        assert_eq!(loc, Location::rom(0xc0_8000));
        assert_eq!(loc.to_string(), "ROM:C08000");
        assert_eq!("reg:0x2100".parse::<Location>().unwrap().region, Region::Register);
        assert_eq!("2:10".parse::<Location>().unwrap(), Location::wram(0x10));
        assert!("ROM".parse::<Location>().is_err());
        assert!("ROM:zz".parse::<Location>().is_err());
    }

    #[test]
    fn region_ids() {
        for region in Region::ALL {
            assert_eq!(Region::from_id(region.id()), Some(region));
        }
        assert_eq!(Region::from_id(0), None);
        assert!(Region::Rom < Region::Register);
    }
}
