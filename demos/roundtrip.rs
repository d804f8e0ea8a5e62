use mcnbt::{tag_io, CompoundAccess, CompoundTag, CompressionType, ListTag, NbtError, NbtReader, NbtWriter, Tag, TagId};
use std::path::Path;
use uuid::Uuid;

fn main() -> Result<(), NbtError> {
    // 构建一个箱子方块实体
    println!("构建示例数据...");
    let items = ListTag::builder(TagId::Compound, false)
        .add(item("minecraft:diamond", 0, 64))?
        .add(item("minecraft:apple", 1, 3))?
        .build();
    let chest = CompoundTag::builder(false)
        .put("id", "minecraft:chest")
        .put("x", 10)
        .put("y", 64)
        .put("z", -3)
        .put_uuid("owner", Uuid::from_u128(0x1234_5678_9ABC_DEF0_1234_5678_9ABC_DEF0))
        .list("Items", items)
        .build();

    // 整树写入 gzip 文件并读回
    let output_path = Path::new("roundtrip_example.nbt");
    println!("保存到文件: {}", output_path.display());
    tag_io::write_named_file(output_path, "chest", &chest, CompressionType::Gzip)?;

    let loaded = tag_io::read_file(output_path, CompressionType::Gzip)?;
    println!("读回内容: {}", Tag::Compound(loaded.clone()));
    println!("内容一致: {}", loaded == chest);
    println!("所有者: {:?}", loaded.get_uuid("owner"));

    // 流式写入同一结构，与整树编码结果比较
    let mut writer = NbtWriter::new(Vec::new());
    writer.name("chest")?.write_tag(&Tag::Compound(chest.clone()))?;
    let streamed = writer.finish()?;

    let mut tree = Vec::new();
    tag_io::write_named(&mut tree, "chest", &chest, CompressionType::None)?;
    println!("流式编码与整树编码一致: {}", streamed == tree);

    // 流式读取：只取出坐标
    let mut reader = NbtReader::new(streamed.as_slice());
    reader.begin_compound()?;
    let mut position = Vec::new();
    while reader.has_next()? {
        let name = reader.next_name()?;
        match name.as_str() {
            "x" | "y" | "z" => position.push(reader.next_int()?),
            _ => {
                reader.next_tag()?;
            }
        }
    }
    reader.end_compound()?;
    println!("坐标: {:?}", position);

    std::fs::remove_file(output_path)?;
    Ok(())
}

fn item(id: &str, slot: i8, count: i8) -> CompoundTag {
    CompoundTag::builder(false)
        .put("id", id)
        .put("Slot", slot)
        .put("Count", count)
        .build()
}
