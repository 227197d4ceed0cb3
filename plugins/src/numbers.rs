//! Spoken number parsing: "twenty five", "two point five", "one hundred and
//! ten", or plain digits. Words that are not numbers are skipped, so
//! "five minutes" reads as 5.

fn small(word: &str) -> Option<u32> {
    let value = match word {
        "zero" | "oh" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(value)
}

/// Parses a spoken quantity. Returns `None` when no number word is present.
pub fn parse_spoken_number(text: &str) -> Option<f64> {
    let lowered = text.to_lowercase();
    let tokens = lowered
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|t| !t.is_empty());

    let mut total = 0.0;
    let mut current = 0.0;
    let mut seen = false;
    let mut fraction: Option<String> = None;

    for token in tokens {
        if let Some(digits) = fraction.as_mut() {
            match small(token) {
                Some(d) if d < 10 => digits.push_str(&d.to_string()),
                _ if token.chars().all(|c| c.is_ascii_digit()) => digits.push_str(token),
                _ => {}
            }
            continue;
        }

        if token.starts_with(|c: char| c.is_ascii_digit()) {
            if let Ok(value) = token.parse::<f64>() {
                current += value;
                seen = true;
            }
            continue;
        }

        match token {
            "hundred" => {
                current = current.max(1.0) * 100.0;
                seen = true;
            }
            "thousand" => {
                total += current.max(1.0) * 1000.0;
                current = 0.0;
                seen = true;
            }
            "point" => fraction = Some(String::new()),
            word => {
                if let Some(value) = small(word) {
                    current += f64::from(value);
                    seen = true;
                }
            }
        }
    }

    if !seen {
        return None;
    }

    let mut value = total + current;
    if let Some(digits) = fraction.filter(|d| !d.is_empty()) {
        if let Ok(frac) = format!("0.{}", digits).parse::<f64>() {
            value += frac;
        }
    }
    Some(value)
}
