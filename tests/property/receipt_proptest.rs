//! Property-based tests for read receipts

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use teamchat::shared::chat::ReadReceipt;
use uuid::Uuid;

use crate::common::TestApp;

const USERS: [&str; 3] = ["alice", "bob", "carol"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_one_receipt_per_message_and_user(
        reads in prop::collection::vec((0usize..4, 0usize..3), 1..30),
    ) {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        let (first_seen, repeats, stored) = runtime.block_on(async {
            let app = TestApp::new();
            let room = app.room(&USERS).await;
            let mut messages = Vec::new();
            for i in 0..4 {
                messages.push(app.send(room.id, "alice", &format!("m{}", i)).await);
            }

            let mut first_seen: HashMap<(Uuid, &str), ReadReceipt> = HashMap::new();
            let mut repeats = Vec::new();
            for (message_index, user_index) in &reads {
                let message = &messages[*message_index];
                let user = USERS[*user_index];
                let receipt = app
                    .state
                    .receipts
                    .mark_read(room.id, message.id, user)
                    .await
                    .expect("mark read");
                match first_seen.get(&(message.id, user)) {
                    Some(first) => repeats.push((receipt, first.clone())),
                    None => {
                        first_seen.insert((message.id, user), receipt);
                    }
                }
            }

            let mut stored = HashMap::new();
            for message in &messages {
                let receipts = app.state.receipts.get_receipts(message.id).await.expect("receipts");
                let users: Vec<String> = receipts.into_iter().map(|r| r.user_id).collect();
                stored.insert(message.id, users);
            }
            (first_seen, repeats, stored)
        });

        for (again, first) in repeats {
            prop_assert_eq!(again, first);
        }
        for (message_id, users) in stored {
            let unique: HashSet<&String> = users.iter().collect();
            prop_assert_eq!(unique.len(), users.len());
            let expected = first_seen.keys().filter(|(id, _)| *id == message_id).count();
            prop_assert_eq!(users.len(), expected);
        }
    }
}
