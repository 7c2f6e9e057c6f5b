/// Column the restaurant allow-list is matched against by default.
pub const RESTAURANT_COLUMN: &str = "RESTAURANTS.NAME";
/// Column the cash-group allow-list is matched against by default.
pub const CASH_GROUP_COLUMN: &str = "CASHGROUPS.NAME";

/// One allow-list: rows pass when `column` equals any of `names`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    pub column: String,
    pub names: Vec<String>,
}

impl AllowList {
    pub fn new(column: &str, names: &[String]) -> Self {
        AllowList {
            column: column.to_string(),
            names: names.to_vec(),
        }
    }

    /// `(COL = 'a' OR COL = 'b')`, or `None` for an empty list.
    fn condition(&self) -> Option<String> {
        if self.names.is_empty() {
            return None;
        }

        let alternatives = self
            .names
            .iter()
            .map(|name| format!("{} = {}", self.column, quote_literal(name)))
            .collect::<Vec<_>>()
            .join(" OR ");

        Some(format!("({alternatives})"))
    }
}

/// SQL boolean fragment restricting extraction to allow-listed groups.
/// Built once at startup; empty when no allow-list has entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlFilter {
    fragment: String,
}

impl SqlFilter {
    /// Joins the conditions of every non-empty list with `AND`.
    pub fn build(lists: &[AllowList]) -> Self {
        let fragment = lists
            .iter()
            .filter_map(AllowList::condition)
            .collect::<Vec<_>>()
            .join(" AND ");

        SqlFilter { fragment }
    }

    /// Filter over the restaurant and cash-group columns.
    pub fn from_allow_lists(
        restaurant_column: &str,
        restaurants: &[String],
        cash_group_column: &str,
        cash_groups: &[String],
    ) -> Self {
        Self::build(&[
            AllowList::new(restaurant_column, restaurants),
            AllowList::new(cash_group_column, cash_groups),
        ])
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn is_empty(&self) -> bool {
        self.fragment.is_empty()
    }

    /// What replaces `{{FILTER}}` in a template: ` AND <fragment>`, or nothing.
    pub fn as_condition(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" AND {}", self.fragment)
        }
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
