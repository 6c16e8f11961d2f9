//! ECS integration tests

mod world_integration;
