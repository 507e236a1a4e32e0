//! Known activity names.
//!
//! The catalog taxonomy is fixed at load time. Names may repeat across
//! branches ("Запчасти", "Аксессуары"); lookups resolve duplicates to the
//! lowest activity id.

/// `(root, [(child, [grandchild])])`
pub const ACTIVITY_TAXONOMY: &[(&str, &[(&str, &[&str])])] = &[
    (
        "Еда",
        &[
            ("Мясная продукция", &[]),
            ("Молочная продукция", &[]),
            ("Кондитерские изделия", &[]),
        ],
    ),
    (
        "Автомобили",
        &[
            ("Грузовые", &[]),
            ("Легковые", &["Запчасти", "Аксессуары"]),
            ("Запчасти", &[]),
        ],
    ),
    (
        "Услуги",
        &[("Ремонт", &[]), ("Доставка", &[]), ("Аксессуары", &[])],
    ),
];

/// Whether `name` appears anywhere in the taxonomy.
pub fn is_known_activity(name: &str) -> bool {
    ACTIVITY_TAXONOMY.iter().any(|(root, children)| {
        *root == name
            || children
                .iter()
                .any(|(child, grandchildren)| *child == name || grandchildren.contains(&name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_children_and_grandchildren_are_known() {
        assert!(is_known_activity("Еда"));
        assert!(is_known_activity("Молочная продукция"));
        assert!(is_known_activity("Аксессуары"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(!is_known_activity("еда"));
        assert!(!is_known_activity("Одежда"));
    }
}
