use rand::Rng;
use rand::seq::SliceRandom;

const NAMES: &[&str] = &[
    "Aerith", "Bryn", "Caelum", "Dain", "Erya", "Fael", "Gael", "Hylia", "Isen", "Jorah", "Kaelen",
    "Liora", "Mira", "Nerys", "Orin", "Pyria", "Quen", "Ryn", "Selar", "Talen", "Uria", "Veyra",
    "Wyn", "Xyra", "Ylric", "Zareth", "Alaric", "Brivan", "Ceryn", "Draven", "Eryndor", "Feyra",
    "Grim", "Havok", "Iliana", "Jalen", "Krynn", "Lorien", "Myra", "Nyssa", "Oryn", "Pyrrin",
    "Quorra", "Ryker", "Sorin", "Tirian", "Vael", "Wrenna", "Xanor", "Zylen",
];

const EPITHETS: &[&str] = &[
    "Brave", "Wise", "Noble", "Swift", "Fierce", "Mystic", "Shadow", "Silent", "Valiant",
];

/// Bot name such as `Liora42`.
pub fn generate_short_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let name = NAMES.choose(rng).copied().unwrap_or("Bot");
    format!("{name}{}", rng.gen_range(0..100))
}

/// Bot name such as `MiraSilent7`.
pub fn generate_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let name = NAMES.choose(rng).copied().unwrap_or("Bot");
    let epithet = EPITHETS.choose(rng).copied().unwrap_or("");
    format!("{name}{epithet}{}", rng.gen_range(0..100))
}
