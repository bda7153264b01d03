pub mod ecs_s3;
