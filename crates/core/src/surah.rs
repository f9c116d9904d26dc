//! Reference table of chapters (surahs) and their verse counts.

/// Display name returned for chapter indices outside the table.
pub const UNKNOWN_SURAH: &str = "Unknown Surah";

/// A chapter of the Qur'an.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surah {
    /// 1-based position in canonical order
    pub index: u32,
    /// Display name
    pub name: &'static str,
    /// Number of verses in the chapter
    pub verse_count: u32,
}

/// Chapters in canonical order.
///
/// Only the first five chapters are populated.
pub const SURAHS: &[Surah] = &[
    Surah {
        index: 1,
        name: "Al-Fatiha",
        verse_count: 7,
    },
    Surah {
        index: 2,
        name: "Al-Baqarah",
        verse_count: 286,
    },
    Surah {
        index: 3,
        name: "Aali Imran",
        verse_count: 200,
    },
    Surah {
        index: 4,
        name: "An-Nisa",
        verse_count: 176,
    },
    Surah {
        index: 5,
        name: "Al-Ma'idah",
        verse_count: 120,
    },
];

/// Number of chapters in the table.
pub const CHAPTER_COUNT: i64 = SURAHS.len() as i64;

/// Sum of verse counts over the whole table.
pub const TOTAL_VERSES: u64 = total_verses();

const fn total_verses() -> u64 {
    let mut sum = 0u64;
    let mut i = 0;
    while i < SURAHS.len() {
        sum += SURAHS[i].verse_count as u64;
        i += 1;
    }
    sum
}

/// Look up a chapter by its 1-based index.
pub fn surah(index: i64) -> Option<&'static Surah> {
    let position = usize::try_from(index.checked_sub(1)?).ok()?;
    SURAHS.get(position)
}

/// Display name of a chapter, or [`UNKNOWN_SURAH`] when out of range.
pub fn name(index: i64) -> &'static str {
    surah(index).map_or(UNKNOWN_SURAH, |s| s.name)
}

/// Verse count of a chapter, or 0 when out of range.
pub fn verse_count(index: i64) -> u32 {
    surah(index).map_or(0, |s| s.verse_count)
}
