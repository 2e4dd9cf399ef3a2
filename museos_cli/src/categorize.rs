use crate::utils::Table;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Historia,
    Ciencia,
    Arte,
    Antropologia,
    Literatura,
    Otro,
}

impl Category {
    /// Declaration order. Ties are resolved in favor of the earlier entry.
    pub const ALL: [Category; 6] = [
        Category::Historia,
        Category::Ciencia,
        Category::Arte,
        Category::Antropologia,
        Category::Literatura,
        Category::Otro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Historia => "Historia",
            Category::Ciencia => "Ciencia",
            Category::Arte => "Arte",
            Category::Antropologia => "Antropología",
            Category::Literatura => "Literatura",
            Category::Otro => "Otro",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const KEYWORDS: [(Category, &[&str]); 5] = [
    (
        Category::Historia,
        &[
            "historia", "histórico", "prehispánico", "azteca", "maya", "conquista", "colonial",
            "revolución", "independencia", "antiguo", "arqueológico", "méxico prehispánico",
            "templo mayor", "ancestral",
        ],
    ),
    (
        Category::Ciencia,
        &[
            "ciencia", "científico", "física", "química", "biología", "tecnología",
            "tecnológico", "biodiversidad", "naturaleza", "universum", "experimento",
            "interactivo",
        ],
    ),
    (
        Category::Arte,
        &[
            "arte", "artístico", "pintura", "escultura", "obra", "frida", "diego", "cultura",
            "artesanía", "cerámica", "grabado", "fotograf",
        ],
    ),
    (
        Category::Antropologia,
        &[
            "antropología", "antropológico", "etnografía", "etnográfico", "pueblos",
            "costumbres", "tradición", "indígena",
        ],
    ),
    (
        Category::Literatura,
        &[
            "literatura", "literario", "cervantes", "biblioteca", "escritor", "poesía",
            "novela", "documento",
        ],
    ),
];

static PATTERNS: LazyLock<Vec<(Category, Vec<Regex>)>> = LazyLock::new(|| {
    KEYWORDS
        .iter()
        .map(|(category, words)| {
            let regexes = words
                .iter()
                .map(|w| Regex::new(&format!(r"\b{}\b", regex::escape(w))).expect("keyword regex"))
                .collect();
            (*category, regexes)
        })
        .collect()
});

/// Keyword score of `name` + `summary` for every scored category, in declaration order.
pub fn scores(name: &str, summary: &str) -> Vec<(Category, usize)> {
    let text = format!("{} {}", name, summary).to_lowercase();
    PATTERNS
        .iter()
        .map(|(category, regexes)| {
            let score = regexes.iter().map(|re| re.find_iter(&text).count()).sum();
            (*category, score)
        })
        .collect()
}

/// Best-scoring category, `Otro` when no keyword matches.
pub fn categorize(name: &str, summary: &str) -> Category {
    let mut best = (Category::Otro, 0);
    for (category, score) in scores(name, summary) {
        if score > best.1 {
            best = (category, score);
        }
    }
    best.0
}

/// Sets `categoria` on every row and returns how many rows fell in each category,
/// most frequent first.
pub fn categorize_table(table: &mut Table) -> Vec<(Category, usize)> {
    let col = table.ensure_column("categoria");
    let mut counts = [0usize; Category::ALL.len()];

    for idx in 0..table.len() {
        let category = categorize(table.get(idx, "nombre_oficial"), table.get(idx, "resumen"));
        table.rows[idx][col] = category.to_string();
        if let Some(pos) = Category::ALL.iter().position(|c| *c == category) {
            counts[pos] += 1;
        }
    }

    let mut distribution: Vec<_> = Category::ALL
        .into_iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1));
    distribution
}
