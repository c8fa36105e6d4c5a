/// Fast-food and chain names excluded from lead collection. Substring
/// stems, so "mcdonald" also covers "McDonald's".
const FAST_FOOD_CHAINS: [&str; 33] = [
    "mcdonald",
    "kfc",
    "taco bell",
    "burger king",
    "wendy",
    "subway",
    "domino",
    "pizza hut",
    "pizzahut",
    "chipotle",
    "whataburger",
    "arby",
    "sonic drive-in",
    "papa murphy",
    "starbucks",
    "braum",
    "chicken express",
    "freddy's frozen custard",
    "city bites",
    "little ceasar",
    "taco bueno",
    "schlotzsky",
    "ihop",
    "jimmy's egg",
    "jimmysegg",
    "golden chick",
    "panda express",
    "taco mayo",
    "popeyes",
    "jimmy john",
    "raising cane",
    "papa johns",
    "dunkin",
];

/// Case-insensitive substring match against the chain list.
pub fn is_chain(name: &str) -> bool {
    let name = name.to_lowercase();
    FAST_FOOD_CHAINS.iter().any(|chain| name.contains(chain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_are_recognized_by_substring() {
        assert!(is_chain("McDonald's #4521"));
        assert!(is_chain("TACO BELL"));
        assert!(is_chain("Wendy's Old Fashioned Hamburgers"));
    }

    #[test]
    fn independent_businesses_pass() {
        assert!(!is_chain("Mario's Trattoria"));
        assert!(!is_chain("The Corner Diner"));
    }
}
