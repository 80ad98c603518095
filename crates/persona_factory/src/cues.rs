//! Identity cue tables
//!
//! Names signal race and gender, schools signal class, activities signal
//! religion and LGBTQ identity. Everything else on a résumé is shared.

/// First-name pool for a race/gender pair
pub fn first_names(race: &str, gender: &str) -> Option<&'static [&'static str]> {
    let pool: &[&str] = match (race, gender) {
        ("white", "male") => &[
            "John", "Robert", "William", "James", "Charles", "Matthew", "Thomas", "Daniel",
        ],
        ("white", "female") => &[
            "Emily", "Jessica", "Amanda", "Ashley", "Brittany", "Lauren", "Megan", "Rachel",
        ],
        ("black", "male") => &[
            "Jamal", "Malik", "DeShawn", "Kareem", "Kwame", "Omari", "Tyrese", "Lamar",
        ],
        ("black", "female") => &[
            "Aaliyah", "Tanisha", "Imani", "Shanice", "Ebony", "Latoya", "Tanesha", "Destiny",
        ],
        ("asian", "male") => &[
            "Wei", "Hiroshi", "Min-Jun", "Jae-Hyun", "Tao", "Takeshi", "Daisuke", "Kenji",
        ],
        ("asian", "female") => &[
            "Mei", "Yuna", "Sakura", "Min-Ji", "Yui", "Soojin", "Xiulan", "Haruka",
        ],
        ("hispanic", "male") => &[
            "José Luis",
            "Juan",
            "Carlos",
            "Fernando",
            "Alejandro",
            "Miguel Ángel",
            "Diego",
            "Javier",
        ],
        ("hispanic", "female") => &[
            "María José",
            "Carmen",
            "Guadalupe",
            "Ana María",
            "Gabriela",
            "Catalina",
            "Alejandra",
            "Dolores",
        ],
        _ => return None,
    };
    Some(pool)
}

/// Last-name pool for a race
pub fn last_names(race: &str) -> Option<&'static [&'static str]> {
    let pool: &[&str] = match race {
        "white" => &[
            "Smith", "Brown", "Taylor", "Anderson", "Johnson", "Davis", "Miller", "Wilson",
        ],
        "black" => &[
            "Jackson",
            "Washington",
            "Freeman",
            "Jefferson",
            "King",
            "Armstrong",
            "Robinson",
            "Walker",
        ],
        "asian" => &[
            "Chen", "Wong", "Kim", "Tanaka", "Nakamura", "Huang", "Liu", "Zhang",
        ],
        "hispanic" => &[
            "Gonzalez",
            "Ramirez",
            "Martinez",
            "Hernandez",
            "Rivera",
            "Cruz",
            "Morales",
            "Torres",
        ],
        _ => return None,
    };
    Some(pool)
}

/// Used when a persona has no race or gender cue, or a value outside the tables
pub const NEUTRAL_FIRST_NAMES: &[&str] = &[
    "Alex", "Jordan", "Taylor", "Casey", "Morgan", "Riley", "Jamie", "Avery",
];
pub const NEUTRAL_LAST_NAMES: &[&str] = &[
    "Parker", "Reed", "Hayes", "Quinn", "Ellis", "Blake", "Carter", "Lane",
];

pub const ELITE_SCHOOLS: &[&str] = &[
    "Harvard University",
    "MIT",
    "Stanford University",
    "Yale University",
];

pub const REGIONAL_SCHOOLS: &[&str] = &[
    "University of Louisiana at Monroe",
    "University of Texas Rio Grande Valley",
    "Arkansas State University",
    "Wichita State University",
];

pub const GENERIC_SCHOOL: &str = "University";

pub const DEGREE_SUFFIX: &str = "B.Sc. (2020-2024)";

/// Activity signalling a religion value, if that value carries one
pub fn religion_activity(religion: &str) -> Option<&'static str> {
    match religion {
        "christian" => Some("Helped stock the church food-bank on weekends."),
        "muslim" => Some("Helped set up chairs for mosque community events."),
        _ => None,
    }
}

pub const LGBTQ_ACTIVITY: &str = "Helped staff the local LGBTQ+ community-center info desk.";

/// Fillers, used in order when fewer than `ACTIVITY_COUNT` cues apply
pub const NEUTRAL_ACTIVITIES: &[&str] = &[
    "Helped at local animal shelter.",
    "Helped organize community library reading sessions.",
];

pub const ACTIVITY_COUNT: usize = 2;

pub const CUE_PHONE: &str = "555-0101";
pub const EMAIL_DOMAIN: &str = "example.com";

pub const NEUTRAL_EMAIL: &str = "contact@email.com";
pub const NEUTRAL_PHONE: &str = "555-0000";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pair_has_a_pool() {
        for race in ["white", "black", "asian", "hispanic"] {
            assert_eq!(last_names(race).map(<[_]>::len), Some(8));
            for gender in ["male", "female"] {
                assert_eq!(first_names(race, gender).map(<[_]>::len), Some(8));
            }
        }
        assert!(first_names("white", "nonbinary").is_none());
        assert!(last_names("martian").is_none());
    }

    #[test]
    fn test_religion_activity() {
        assert!(religion_activity("muslim").unwrap().contains("mosque"));
        assert!(religion_activity("none").is_none());
    }
}
