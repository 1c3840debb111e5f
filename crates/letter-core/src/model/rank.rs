use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Rank {
    Spy = 0,
    Guard = 1,
    Priest = 2,
    Baron = 3,
    Handmaid = 4,
    Prince = 5,
    Chancellor = 6,
    King = 7,
    Countess = 8,
    Princess = 9,
}

impl Rank {
    pub const ORDERED: [Rank; 10] = [
        Rank::Spy,
        Rank::Guard,
        Rank::Priest,
        Rank::Baron,
        Rank::Handmaid,
        Rank::Prince,
        Rank::Chancellor,
        Rank::King,
        Rank::Countess,
        Rank::Princess,
    ];

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Rank::Spy),
            1 => Some(Rank::Guard),
            2 => Some(Rank::Priest),
            3 => Some(Rank::Baron),
            4 => Some(Rank::Handmaid),
            5 => Some(Rank::Prince),
            6 => Some(Rank::Chancellor),
            7 => Some(Rank::King),
            8 => Some(Rank::Countess),
            9 => Some(Rank::Princess),
            _ => None,
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Number of copies of this rank in the catalog.
    pub const fn quantity(self) -> u8 {
        match self {
            Rank::Spy => 2,
            Rank::Guard => 6,
            Rank::Priest => 2,
            Rank::Baron => 2,
            Rank::Handmaid => 2,
            Rank::Prince => 2,
            Rank::Chancellor => 2,
            Rank::King => 1,
            Rank::Countess => 1,
            Rank::Princess => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Rank::Spy => "spy",
            Rank::Guard => "guard",
            Rank::Priest => "priest",
            Rank::Baron => "baron",
            Rank::Handmaid => "handmaid",
            Rank::Prince => "prince",
            Rank::Chancellor => "chancellor",
            Rank::King => "king",
            Rank::Countess => "countess",
            Rank::Princess => "princess",
        }
    }

    /// Total number of cards in the catalog.
    pub const fn catalog_size() -> usize {
        let mut total = 0usize;
        let mut value = 0u8;
        while value < 10 {
            if let Some(rank) = Rank::from_value(value) {
                total += rank.quantity() as usize;
            }
            value += 1;
        }
        total
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rank::Spy => "Spy",
            Rank::Guard => "Guard",
            Rank::Priest => "Priest",
            Rank::Baron => "Baron",
            Rank::Handmaid => "Handmaid",
            Rank::Prince => "Prince",
            Rank::Chancellor => "Chancellor",
            Rank::King => "King",
            Rank::Countess => "Countess",
            Rank::Princess => "Princess",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::Rank;

    #[test]
    fn from_value_maps() {
        assert_eq!(Rank::from_value(7), Some(Rank::King));
        assert_eq!(Rank::from_value(10), None);
    }

    #[test]
    fn catalog_has_twenty_one_cards() {
        assert_eq!(Rank::catalog_size(), 21);
        assert_eq!(Rank::Guard.quantity(), 6);
    }

    #[test]
    fn display_and_name_differ_in_case() {
        assert_eq!(Rank::Countess.to_string(), "Countess");
        assert_eq!(Rank::Countess.name(), "countess");
    }
}
