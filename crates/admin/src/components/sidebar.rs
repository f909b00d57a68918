//! The sidebar menu.
//!
//! The menu is static configuration; templates highlight the entry whose
//! path prefixes the current request path.

#[derive(Debug, Clone, Copy)]
pub struct MenuItem {
    pub href: &'static str,
    pub label: &'static str,
}

impl MenuItem {
    /// `/` only matches itself; other entries match their own subtree.
    #[must_use]
    pub fn is_active(&self, current_path: &str) -> bool {
        if self.href == "/" {
            return current_path == "/";
        }
        current_path
            .strip_prefix(self.href)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MenuSection {
    pub title: &'static str,
    pub items: &'static [MenuItem],
}

pub static ADMIN_MENU: &[MenuSection] = &[
    MenuSection {
        title: "Overview",
        items: &[MenuItem {
            href: "/",
            label: "Dashboard",
        }],
    },
    MenuSection {
        title: "Catalog",
        items: &[
            MenuItem {
                href: "/products",
                label: "Products",
            },
            MenuItem {
                href: "/categories",
                label: "Categories",
            },
        ],
    },
    MenuSection {
        title: "Fulfilment",
        items: &[
            MenuItem {
                href: "/orders",
                label: "Orders",
            },
            MenuItem {
                href: "/drivers",
                label: "Drivers",
            },
            MenuItem {
                href: "/shifts",
                label: "Shifts",
            },
        ],
    },
    MenuSection {
        title: "Content",
        items: &[MenuItem {
            href: "/content/about",
            label: "About page",
        }],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn item(href: &'static str) -> MenuItem {
        MenuItem { href, label: "" }
    }

    #[test]
    fn test_dashboard_only_matches_root() {
        assert!(item("/").is_active("/"));
        assert!(!item("/").is_active("/orders"));
    }

    #[test]
    fn test_section_matches_subtree_on_segment_boundary() {
        assert!(item("/orders").is_active("/orders"));
        assert!(item("/orders").is_active("/orders/42"));
        assert!(!item("/orders").is_active("/ordersx"));
        assert!(!item("/products").is_active("/orders"));
    }

    #[test]
    fn test_every_menu_path_is_unique() {
        let mut hrefs: Vec<_> = ADMIN_MENU
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.href))
            .collect();
        let count = hrefs.len();
        hrefs.sort_unstable();
        hrefs.dedup();
        assert_eq!(hrefs.len(), count);
    }
}
