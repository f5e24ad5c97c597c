// @generated
pub mod babylon {
    pub mod finality {
        // @@protoc_insertion_point(attribute:babylon.finality.v1)
        pub mod v1 {
            include!("gen/babylon.finality.v1.rs");
            // @@protoc_insertion_point(babylon.finality.v1)
        }
    }
}
