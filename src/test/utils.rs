use crate::catalog::Prize;
use crate::ledger::Ledger;
use crate::storage::KeyValueStore;
use std::path::PathBuf;

/// Csv output path under target/, created on demand
pub fn _get_test_output_file(filename: &str, test_subdir: &str) -> String {
    let mut f = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    f.push(format!("target/test-outputs/{}/{}.csv", test_subdir, filename));
    let parent = f.parent().unwrap();
    std::fs::create_dir_all(parent).unwrap();
    f.to_str().unwrap().to_string()
}

pub fn _prize(id: &str, name: &str, cost: i64) -> Prize {
    Prize {
        id: id.to_string(),
        name: name.to_string(),
        cost,
        icon: None,
        image_url: None,
    }
}

/// Brings the balance up from zero with a single earned transaction
pub fn _fund<S: KeyValueStore + ?Sized>(store: &mut S, stars: i64) {
    if stars != 0 {
        Ledger::new(store)
            .apply_transaction(stars, "Conquered Read Book")
            .unwrap();
    }
}
