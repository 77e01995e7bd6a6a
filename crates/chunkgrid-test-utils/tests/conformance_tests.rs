// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Every fixture in the matrix passes the same conformance checks

use chunkgrid_test_utils::{assert_conformance, fixtures, init_test_logging, Fixture};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_fixture_conforms() {
    init_test_logging();

    let mut tasks = Vec::new();
    for fixture in fixtures() {
        tasks.push(tokio::spawn(async move {
            let clients = fixture
                .clients()
                .await
                .unwrap_or_else(|e| panic!("activation failed: {e}"));
            assert_conformance(&clients).await;
            clients.release();
            fixture.name().to_string()
        }));
    }

    let mut passed = Vec::new();
    for task in tasks {
        passed.push(task.await.unwrap());
    }
    assert_eq!(passed.len(), 8);
}

#[tokio::test]
async fn test_hedged_object_store_conforms() {
    use chunkgrid_storage::HedgingConfig;
    use chunkgrid_test_utils::widecolumn::fixtures_with;
    use chunkgrid_test_utils::FixtureOptions;
    use std::time::Duration;

    let options = FixtureOptions {
        hedging: HedgingConfig::new(Duration::from_millis(5), 3),
        ..Default::default()
    };
    for fixture in fixtures_with(&options)
        .into_iter()
        .filter(|f| f.configuration().chunk_backend.is_object_store())
    {
        let clients = fixture.clients().await.unwrap();
        assert_conformance(&clients).await;
        clients.release();
    }
}
