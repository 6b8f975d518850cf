use super::Position;

pub fn parse(input: &str) -> Option<Position> {
    let input = input.trim();

    if let Some((x, y)) = input.split_once(',') {
        let x = x.trim().parse().ok()?;
        let y = y.trim().parse().ok()?;
        return Some(Position::new(x, y));
    }

    let compact = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();

    let letters = compact
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>();
    let digits = compact
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>();

    // letters and digits must form two contiguous groups, in either order
    if letters.len() != 1 || digits.is_empty() || letters.len() + digits.len() != compact.len() {
        return None;
    }
    if !(compact.starts_with(&letters) || compact.ends_with(&letters)) {
        return None;
    }

    let column = letters.chars().next()?.to_ascii_uppercase();
    let row: usize = digits.parse().ok()?;

    if row == 0 {
        return None;
    }

    Some(Position::new((column as u8 - b'A') as usize, row - 1))
}

pub fn format(position: Position) -> String {
    format!("{}{}", (b'A' + position.x as u8) as char, position.y + 1)
}
