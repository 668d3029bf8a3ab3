//! Demo catalog seeding.
//!
//! Generates a deterministic product catalog so a fresh database has something
//! to search. Titles are unique, and inserts skip existing titles, so seeding
//! the same store twice leaves it unchanged.

use super::{Item, StorageError, Store};

const SEED: u64 = 42;

const BRANDS: &[&str] = &[
    "Apple", "Samsung", "Xiaomi", "Huawei", "Sony", "Dell", "Lenovo", "ASUS", "LG", "Panasonic",
    "Logitech", "Bose", "JBL", "TP-Link", "Dyson",
];

const ADJECTIVES: &[&str] = &[
    "Pro", "Max", "Ultra", "Plus", "Lite", "Air", "Mini", "Elite", "Premium", "Standard",
];

/// Category name and the product photos used for it.
const CATEGORIES: &[(&str, [&str; 3])] = &[
    ("手机", ["photo-1511707171634-5f897ff02aa9", "photo-1592899677977-9c10ca588bbd", "photo-1605236453806-6ff36851218e"]),
    ("笔记本电脑", ["photo-1496181133206-80ce9b88a853", "photo-1525547719571-a2d4ac8945e2", "photo-1588872657578-7efd1f1555ed"]),
    ("平板电脑", ["photo-1544244015-0df4b3ffc6b0", "photo-1585790050230-5dd28404ccb9", "photo-1561154464-82e9adf32764"]),
    ("耳机", ["photo-1505740420928-5e560c06d30e", "photo-1583394838336-acd977736f90", "photo-1484704849700-f032a568e944"]),
    ("智能手表", ["photo-1523275335684-37898b6baf30", "photo-1546868871-7041f2a55e12", "photo-1579586337278-3befd40fd17a"]),
    ("相机", ["photo-1516035069371-29a1b244cc32", "photo-1502920917128-1aa500764cbd", "photo-1510127034890-ba27508e9f1c"]),
    ("电视", ["photo-1593359677879-a4bb92f829d1", "photo-1567690187548-f07b1d7bf5a9", "photo-1461151304267-38535e780c79"]),
    ("冰箱", ["photo-1571175443880-49e1d25b2bc5", "photo-1584568694244-14fbdf83bd30", "photo-1536353284924-9220c464e262"]),
    ("洗衣机", ["photo-1626806787461-102c1bfaaea1", "photo-1604335399105-a0c585fd81a1", "photo-1610557892470-55d9e80c0571"]),
    ("空调", ["photo-1585771724684-38269d6639fd", "photo-1631567937959-6a82a7c8bb00", "photo-1625961332771-3f40b0e2bdcf"]),
    ("键盘", ["photo-1587829741301-dc798b83add3", "photo-1618384887929-16ec33fab9ef", "photo-1595225476474-87563907a212"]),
    ("鼠标", ["photo-1527864550417-7fd91fc51a46", "photo-1615663245857-ac93bb7c39e7", "photo-1613141411244-0e4ac259d217"]),
    ("显示器", ["photo-1527443224154-c4a3942d3acf", "photo-1585792180666-f7347c490ee2", "photo-1616763355548-1b606f439f86"]),
    ("音箱", ["photo-1545454675-3531b543be5d", "photo-1608043152269-423dbba4e7e1", "photo-1507003211169-0a1dd7228f2d"]),
    ("路由器", ["photo-1606904825846-647eb07f5be2", "photo-1544197150-b99a580bb7a8", "photo-1558494949-ef010cbdcc31"]),
];

fn image_url(photo: &str) -> String {
    format!("https://images.unsplash.com/{photo}?w=300&h=300&fit=crop")
}

/// Build the `n` catalog entries; identical output for identical `n`.
pub fn catalog(n: usize) -> Vec<Item> {
    let mut rng = fastrand::Rng::with_seed(SEED);
    (1..=n)
        .map(|i| {
            let brand = BRANDS[i % BRANDS.len()];
            let (category, photos) = CATEGORIES[i % CATEGORIES.len()];
            let adjective = ADJECTIVES[i % ADJECTIVES.len()];
            let photo = photos[(i / CATEGORIES.len()) % photos.len()];

            let price = 500 + (i % 50) as u64 * 200 + rng.u64(0..1000);
            Item::new(format!("{brand} {category} {adjective} {i}"), price as f64, image_url(photo))
        })
        .collect()
}

/// Insert `n` catalog items into `store`. Returns the number submitted.
pub fn seed_catalog(store: &dyn Store, n: usize) -> Result<usize, StorageError> {
    let items = catalog(n);
    for item in &items {
        store.insert_item(item)?;
    }
    tracing::info!(products = items.len(), "Seeded catalog");
    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SqliteStore};

    #[test]
    fn catalog_is_deterministic() {
        assert_eq!(catalog(50), catalog(50));
        let items = catalog(3);
        assert_eq!(items[0].title, "Samsung 笔记本电脑 Max 1");
        assert!(items[0].image_url.starts_with("https://images.unsplash.com/"));
    }

    #[test]
    fn every_category_photo_is_used() {
        let items = catalog(CATEGORIES.len() * 3);
        for (_, photos) in CATEGORIES {
            for photo in photos {
                assert!(items.iter().any(|item| item.image_url == image_url(photo)), "{photo} unused");
            }
        }
    }

    #[test]
    fn category_names_are_searchable() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        seed_catalog(&store, 30).unwrap();

        let phones = store.search("手机", 10, 0).unwrap();
        assert_eq!(phones.len(), 2);
        assert!(phones.iter().all(|item| item.title.contains("手机")));
        assert_eq!(store.count("笔记本电脑").unwrap(), 2);
    }

    #[test]
    fn prices_stay_in_range() {
        for (i, item) in catalog(200).iter().enumerate() {
            let base = 500.0 + ((i + 1) % 50) as f64 * 200.0;
            assert!(item.price >= base && item.price < base + 1000.0, "{item:?}");
        }
    }

    #[test]
    fn reseeding_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        seed_catalog(&store, 100).unwrap();
        seed_catalog(&store, 100).unwrap();
        assert_eq!(store.count("").unwrap(), 100);

        let memory = MemoryStore::new();
        seed_catalog(&memory, 30).unwrap();
        assert_eq!(memory.count("Apple").unwrap(), 2);
    }
}
