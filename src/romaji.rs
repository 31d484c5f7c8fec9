//! Kana to romaji for search.
//!
//! Each kana is transliterated on its own with `unidecode`, whose tables are
//! Kunrei-flavoured (`si`, `tu`, `hu`), then respelled as Hepburn so a query
//! typed the usual way ("akatsuki", "shigure", "fubuki") matches. Small
//! ya/yu/yo and the small vowels used in loanwords fold into the previous
//! syllable, and a small tsu doubles the next consonant.

use unidecode::unidecode_char;

/// Transliterate a phonetic key to lowercase Hepburn romaji.
pub fn to_romaji(kana: &str) -> String {
    let mut out = String::with_capacity(kana.len());
    let mut geminate = false;
    // start of the last full syllable in `out`
    let mut syllable_start = 0;

    for ch in kana.chars() {
        match ch {
            'っ' | 'ッ' => {
                geminate = true;
                continue;
            }
            'ー' => {
                out.push('-');
                syllable_start = out.len();
                continue;
            }
            'ゃ' | 'ャ' => {
                fold_small_y(&mut out, 'a');
                continue;
            }
            'ゅ' | 'ュ' => {
                fold_small_y(&mut out, 'u');
                continue;
            }
            'ょ' | 'ョ' => {
                fold_small_y(&mut out, 'o');
                continue;
            }
            'ぁ' | 'ァ' | 'ぃ' | 'ィ' | 'ぅ' | 'ゥ' | 'ぇ' | 'ェ' | 'ぉ' | 'ォ' => {
                fold_small_vowel(&mut out, syllable_start, small_vowel(ch));
                continue;
            }
            _ => {}
        }

        let syllable = hepburn(unidecode_char(ch));
        if geminate {
            geminate = false;
            if syllable.starts_with("ch") {
                out.push('t');
            } else if let Some(first) = syllable.chars().next().filter(|c| !is_vowel(*c)) {
                out.push(first);
            }
        }
        syllable_start = out.len();
        out.push_str(&syllable);
    }

    out
}

fn hepburn(syllable: &str) -> String {
    let lower = syllable.to_ascii_lowercase();
    match lower.as_str() {
        "si" => "shi".to_string(),
        "ti" => "chi".to_string(),
        "tu" => "tsu".to_string(),
        "hu" => "fu".to_string(),
        "zi" | "di" => "ji".to_string(),
        "du" => "zu".to_string(),
        _ => lower,
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'i' | 'u' | 'e' | 'o')
}

fn small_vowel(ch: char) -> char {
    match ch {
        'ぁ' | 'ァ' => 'a',
        'ぃ' | 'ィ' => 'i',
        'ぅ' | 'ゥ' => 'u',
        'ぇ' | 'ェ' => 'e',
        _ => 'o',
    }
}

/// The small vowel replaces the previous syllable's vowel: `vu` + `e` -> `ve`,
/// `ji` + `e` -> `je`, `te` + `i` -> `ti`. A bare `u` becomes `w` (`wo`).
fn fold_small_vowel(out: &mut String, syllable_start: usize, vowel: char) {
    let last = &out[syllable_start..];
    if last == "u" {
        out.truncate(syllable_start);
        out.push('w');
    } else if last.len() > 1 && last.ends_with(is_vowel) {
        out.pop();
    }
    out.push(vowel);
}

/// `ki` + small `ya` -> `kya`; `shi`/`chi`/`ji` drop the `y` (`sha`, `cha`, `ja`).
fn fold_small_y(out: &mut String, vowel: char) {
    if out.ends_with("shi") || out.ends_with("chi") || out.ends_with("ji") {
        out.pop();
        out.push(vowel);
    } else if out.ends_with('i') && out.len() > 1 {
        out.pop();
        out.push('y');
        out.push(vowel);
    } else {
        out.push('y');
        out.push(vowel);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hepburn_spellings() {
        assert_eq!(to_romaji("あかつき"), "akatsuki");
        assert_eq!(to_romaji("しぐれ"), "shigure");
        assert_eq!(to_romaji("ちとせ"), "chitose");
        assert_eq!(to_romaji("ふぶき"), "fubuki");
    }

    #[test]
    fn small_kana() {
        assert_eq!(to_romaji("しょうかく"), "shoukaku");
        assert_eq!(to_romaji("きょう"), "kyou");
        assert_eq!(to_romaji("きっさ"), "kissa");
    }

    #[test]
    fn katakana_and_long_vowel() {
        assert_eq!(to_romaji("ネルソン"), "neruson");
        assert_eq!(to_romaji("ヒューストン"), "hyu-suton");
    }

    #[test]
    fn small_vowels_in_loanwords() {
        assert_eq!(to_romaji("ヴェールヌイ"), "ve-runui");
        assert_eq!(to_romaji("ジェーナス"), "je-nasu");
        assert_eq!(to_romaji("ウォースパイト"), "wo-supaito");
        assert_eq!(to_romaji("ティ"), "ti");
        assert_eq!(to_romaji("ファ"), "fa");
        assert_eq!(to_romaji("シェ"), "she");
    }

    #[test]
    fn empty_input() {
        assert_eq!(to_romaji(""), "");
    }
}
