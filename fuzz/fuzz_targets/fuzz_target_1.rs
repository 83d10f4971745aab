#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::Rng;
use skipstore::SyncSkipIndex;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let index = Arc::new(SyncSkipIndex::with_max_level(16));

    for chunk in data.chunks(2) {
        if chunk.len() == 2 {
            index.insert(chunk[0], chunk[1]);
        }
    }

    let threads = (0..8)
        .map(|_| {
            let index = index.clone();
            std::thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..5_000 {
                    let target = rng.gen::<u8>();
                    match rng.gen::<u8>() % 4 {
                        0 => {
                            index.remove(&target);
                        }
                        1 => {
                            index.update(&target, rng.gen::<u8>());
                        }
                        2 => {
                            index.get(&target);
                        }
                        _ => {
                            index.insert(target, rng.gen::<u8>());
                        }
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    for thread in threads {
        thread.join().unwrap()
    }
});
