pub const ITEMS: &str = "items";

// Secondary index: due timestamp -> item id
pub const ITEM_DUE_INDEX: &str = "item_due_index";

pub const REVIEWS: &str = "reviews";
