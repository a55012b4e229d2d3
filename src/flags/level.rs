use super::Error;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
    Os,
}

impl OptLevel {
    pub const ALL: [OptLevel; 5] = [
        OptLevel::O0,
        OptLevel::O1,
        OptLevel::O2,
        OptLevel::O3,
        OptLevel::Os,
    ];

    pub fn code(self) -> char {
        match self {
            OptLevel::O0 => '0',
            OptLevel::O1 => '1',
            OptLevel::O2 => '2',
            OptLevel::O3 => '3',
            OptLevel::Os => 's',
        }
    }

    pub fn from_code(code: char) -> Result<Self, Error> {
        match code {
            '0' => Ok(OptLevel::O0),
            '1' => Ok(OptLevel::O1),
            '2' => Ok(OptLevel::O2),
            '3' => Ok(OptLevel::O3),
            's' => Ok(OptLevel::Os),
            _ => Err(Error::UnknownLevel(code)),
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            OptLevel::O0 => "-O0",
            OptLevel::O1 => "-O1",
            OptLevel::O2 => "-O2",
            OptLevel::O3 => "-O3",
            OptLevel::Os => "-Os",
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        OptLevel::ALL[rng.random_range(0..OptLevel::ALL.len())]
    }
}
