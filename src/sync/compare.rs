/// 判断两个数据块是否需要重写
///
/// 只比较实际读取到的字节；目标块较短（目标文件已到末尾）时一律视为不同。
pub fn blocks_differ(src: &[u8], dest: &[u8]) -> bool {
    src.len() != dest.len() || src != dest
}
