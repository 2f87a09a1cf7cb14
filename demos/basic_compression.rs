use huffman_text::{HuffFile, HuffmanCodec};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sample_text = "Hello, world! This is a sample text for Huffman compression. \
                      The quick brown fox jumps over the lazy dog. \
                      Huffman encoding is a greedy algorithm that builds optimal prefix codes.";

    let codec = HuffmanCodec::new();
    let result = codec.compress(sample_text)?;

    println!(
        "Compressed {} bits to {} bits ({:.1}% saved)",
        result.original_size_bits, result.compressed_size_bits, result.compression_ratio
    );
    for (symbol, code) in result.codes()? {
        println!("  {:?} -> {}", symbol, code);
    }

    // the library never touches the filesystem; saving is up to the caller
    let path = std::env::temp_dir().join("sample.huff");
    std::fs::write(&path, HuffFile::from_result(&result).to_json()?)?;

    let record = HuffFile::from_json(&std::fs::read_to_string(&path)?)?;
    let decompressed_text = record.decompress(&codec)?;
    std::fs::remove_file(&path)?;

    if sample_text == decompressed_text {
        println!("Decompression successful! Data matches exactly.");
    } else {
        println!("Decompression failed! Data mismatch.");
        return Err("Decompression verification failed".into());
    }

    Ok(())
}
