use super::Error;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Toggle {
    OmitFramePointer,
    UnrollLoops,
}

impl Toggle {
    pub const ALL: [Toggle; 2] = [Toggle::OmitFramePointer, Toggle::UnrollLoops];

    pub fn code(self) -> char {
        match self {
            Toggle::OmitFramePointer => 'f',
            Toggle::UnrollLoops => 'u',
        }
    }

    pub fn from_code(code: char) -> Result<Self, Error> {
        match code {
            'f' => Ok(Toggle::OmitFramePointer),
            'u' => Ok(Toggle::UnrollLoops),
            _ => Err(Error::UnknownToggle(code)),
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            Toggle::OmitFramePointer => "-fomit-frame-pointer",
            Toggle::UnrollLoops => "-funroll-loops",
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Toggle::ALL[rng.random_range(0..Toggle::ALL.len())]
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Bit set over [`Toggle::ALL`]. Iteration order is always canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Toggles(u8);

impl Toggles {
    pub fn single(toggle: Toggle) -> Self {
        Toggles(toggle.bit())
    }

    /// Every subset of the toggle set, smallest bit pattern first.
    pub fn subsets() -> impl Iterator<Item = Toggles> {
        (0..(1u8 << Toggle::ALL.len())).map(Toggles)
    }

    /// A uniformly drawn subset with exactly `count` toggles.
    pub fn random<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let mut toggles = Toggles::default();
        let count = count.min(Toggle::ALL.len());
        for index in rand::seq::index::sample(rng, Toggle::ALL.len(), count) {
            toggles.insert(Toggle::ALL[index]);
        }
        toggles
    }

    #[inline]
    pub fn contains(self, toggle: Toggle) -> bool {
        self.0 & toggle.bit() != 0
    }

    /// Returns `false` if the toggle was already present.
    pub fn insert(&mut self, toggle: Toggle) -> bool {
        let present = self.contains(toggle);
        self.0 |= toggle.bit();
        !present
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Toggle> {
        Toggle::ALL
            .into_iter()
            .filter(move |toggle| self.contains(*toggle))
    }
}
