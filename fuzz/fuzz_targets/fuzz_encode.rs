#![no_main]
use arbitrary::Arbitrary;
use gial_rs::{decode_index, AssetDescriptor, EncoderConfig, IndexEncoder, SourceSizes};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Asset {
    name: String,
    asset_type: String,
    folder: u8,
    block: String,
    container: String,
}

#[derive(Arbitrary, Debug)]
struct Input {
    version: String,
    hash: String,
    size: u32,
    assets: Vec<Asset>,
}

// Whatever the encoder accepts must decode back
fuzz_target!(|input: Input| {
    let assets: Vec<AssetDescriptor> = input
        .assets
        .iter()
        .map(|a| {
            AssetDescriptor::new(
                a.name.as_str(),
                a.asset_type.as_str(),
                format!("{}/{}.blk", a.folder, a.block),
                a.container.as_str(),
            )
        })
        .collect();

    let sizes: SourceSizes = assets
        .iter()
        .filter_map(|a| a.source_ref().ok())
        .map(|s| (s.block, input.size as u64))
        .collect();

    let encoder = IndexEncoder::new(EncoderConfig::new("hk4e", input.version, input.hash));
    if let Ok(encoded) = encoder.encode(&assets, &sizes) {
        let index = decode_index(&encoded.bytes).expect("encoded index must decode");
        assert!(index.len() <= assets.len());
    }
});
